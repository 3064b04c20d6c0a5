use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chirp8::{scheduler::lock, sound::Mute, Emulator, Scheduler};

// 200  6A7B  LD VA, 0x7B
// 202  A300  LD I, 0x300
// 204  FA33  LD B, VA          ; 1 2 3 at 0x300
// 206  F265  LD V2, [I]        ; V0=1 V1=2 V2=3
// 208  8014  ADD V0, V1
// 20A  8024  ADD V0, V2
// 20C  6305  LD V3, 5
// 20E  6400  LD V4, 0
// 210  2220  CALL 0x220
// 212  73FF  ADD V3, 0xFF      ; V3 -= 1
// 214  3300  SE V3, 0
// 216  1210  JP 0x210
// 218  1218  JP 0x218
// 220  7403  ADD V4, 3
// 222  00EE  RET
const PROGRAM: [u16; 13] = [
    0x6A7B, 0xA300, 0xFA33, 0xF265, 0x8014, 0x8024, 0x6305, 0x6400, 0x2220, 0x73FF, 0x3300,
    0x1210, 0x1218,
];
const SUBROUTINE: [u16; 2] = [0x7403, 0x00EE];

fn rom() -> Vec<u8> {
    let mut bytes: Vec<u8> = PROGRAM.iter().flat_map(|w| w.to_be_bytes()).collect();
    bytes.resize(0x20, 0);
    bytes.extend(SUBROUTINE.iter().flat_map(|w| w.to_be_bytes()));
    bytes
}

#[test]
fn program_matches_reference_trace() {
    let mut emu = Emulator::with_seed(0);
    emu.load_program(&rom()).unwrap();

    let mut pcs = Vec::new();
    for _ in 0..40 {
        pcs.push(emu.mem.pc.0);
        emu.step().unwrap();
    }

    assert_eq!(
        &pcs[..14],
        &[
            0x200, 0x202, 0x204, 0x206, 0x208, 0x20A, 0x20C, 0x20E, 0x210, 0x220, 0x222, 0x212,
            0x214, 0x216
        ]
    );
    assert_eq!(&pcs[37..], &[0x218, 0x218, 0x218]);

    let snapshot = emu.snapshot(600);
    assert_eq!(snapshot.pc, 0x218);
    assert_eq!(snapshot.index, 0x300);
    assert_eq!(snapshot.sp, 0);
    assert_eq!(snapshot.opcode, 0x1218);
    assert_eq!(
        snapshot.v,
        [6, 2, 3, 0, 15, 0, 0, 0, 0, 0, 0x7B, 0, 0, 0, 0, 0]
    );
    assert_eq!(&emu.mem.bytes()[0x300..0x303], &[1, 2, 3]);
    assert!(emu.frame().is_blank());
}

// Any failed check lands on 0x1FFE: JP 0xFFE, whose SYS 0x000 walks PC off the
// end of memory and faults the run.
const TRAP: u16 = 0x1FFE;

// ALU: results and flags saved with LD [I], VF at 0x300
const ALU: [u16; 26] = [
    0x6012, 0x6134, 0x8200, 0x8211, 0x8300, 0x8312, 0x8400, 0x8413, // 200: OR AND XOR
    0x65F0, 0x6620, 0x8564, 0x8AF0, // 210: ADD carry -> VA
    0x6710, 0x8765, 0x8BF0, // 218: SUB borrow -> VB
    0x6803, 0x8806, 0x8CF0, // 21E: SHR -> VC
    0x6905, 0x8967, 0x8DF0, // 224: SUBN -> VD
    0x6E81, 0x8E0E, 0x7EFF, // 22A: SHL, ADD kk keeps VF
    0xA300, 0xFF55, // 230
];

// skips, CALL/RET and JP V0; V0 counts the branches taken, saved at 0x310
const FLOW: [u16; 28] = [
    0x6000, 0x6105, 0x3105, TRAP, 0x4106, TRAP, 0x6205, 0x5120, TRAP, 0x9100, TRAP, // 234
    0x3106, 0x7001, 0x2280, 0x6300, 0xB25E, // 24A: B25E + V0 (2) = 260
    TRAP, TRAP, TRAP, TRAP, TRAP, TRAP, // 254
    0x7001, 0x1266, TRAP, 0xA310, 0xF055, 0x1290, // 260
];
const SUB: [u16; 2] = [0x7001, 0x00EE]; // 280

// timers, keys, RND, ADD I, font, DRW, CLS, BCD, SYS, unknown, then wait for a key
const MISC: [u16; 33] = [
    0x6A2A, 0xFA15, 0xFB07, 0xFA18, // 290: DT/ST = 42
    0x6C07, 0xEC9E, 0x6D02, 0xECA1, TRAP, // 298: key 7 up
    0xCE00, // 2A2: RND with mask 0
    0xAFFE, 0x6302, 0xF31E, 0x84F0, // 2A4: I overflow -> V4
    0x6509, 0xF529, 0xF065, // 2AC: V0 = first row of glyph 9
    0x6100, 0x6200, 0xD125, 0xD125, 0x86F0, 0xD125, 0x00E0, // 2B2: collision -> V6
    0x67FE, 0xA320, 0xF733, // 2C0: BCD 254 at 0x320
    0xA330, 0xFF55, // 2C6
    0x0ABC, 0xFFFF, 0xF80A, 0x12D0, // 2CA
];

fn assemble(chunks: &[(usize, &[u16])]) -> Vec<u8> {
    let mut bytes = vec![0u8; 0x100];
    for (addr, words) in chunks {
        let mut at = addr - 0x200;
        for word in words.iter() {
            bytes[at..at + 2].copy_from_slice(&word.to_be_bytes());
            at += 2;
        }
    }
    bytes
}

fn opcode_suite() -> Vec<u8> {
    assemble(&[
        (0x200, &ALU[..]),
        (0x234, &FLOW[..]),
        (0x280, &SUB[..]),
        (0x290, &MISC[..]),
    ])
}

#[test]
fn opcode_suite_final_state() {
    let mut emu = Emulator::with_seed(0);
    emu.load_program(&opcode_suite()).unwrap();
    for _ in 0..200 {
        emu.step().unwrap();
    }

    // parked on LD V8, K
    assert_eq!(emu.mem.pc.0, 0x2CE);
    assert_eq!(emu.opcode(), 0xF80A);
    assert_eq!(emu.mem.index.0, 0x330);
    assert_eq!(emu.mem.stack.pointer(), 0);
    assert_eq!(emu.delay_timer.count, 42);
    assert_eq!(emu.sound_timer.count, 42);
    assert!(emu.frame().is_blank());

    let mem = emu.mem.bytes();
    assert_eq!(
        &mem[0x300..0x310],
        &[
            0x12, 0x34, 0x36, 0x10, 0x26, 0x10, 0x20, 0xF0, 0x01, 0x1B, 0x01, 0x00, 0x01, 0x01,
            0x01, 0x01
        ]
    );
    assert_eq!(mem[0x310], 3);
    assert_eq!(&mem[0x320..0x323], &[2, 5, 4]);
    let expected_v = [
        0xF0, 0x00, 0x00, 0x02, 0x01, 0x09, 0x01, 0xFE, 0x01, 0x1B, 0x2A, 0x2A, 0x07, 0x02,
        0x00, 0x00,
    ];
    assert_eq!(&mem[0x330..0x340], &expected_v);
    assert_eq!(emu.regs.all(), expected_v);

    emu.keyboard.key_down(0xB);
    emu.step().unwrap();
    assert_eq!(emu.regs.get(0x8), 0x0B);
    emu.step().unwrap();
    assert_eq!(emu.mem.pc.0, 0x2D0);
}

fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

#[test]
fn paused_scheduler_runs_one_cycle_per_step() {
    let emu = Arc::new(Mutex::new(Emulator::with_seed(0)));
    let mut scheduler = Scheduler::new(Arc::clone(&emu), 1_000_000, Box::new(Mute));
    scheduler.load_program(&rom()).unwrap();
    scheduler.pause();
    scheduler.start();

    thread::sleep(Duration::from_millis(20));
    assert_eq!(scheduler.snapshot().pc, 0x200);

    scheduler.step_once();
    assert!(wait_for(Duration::from_secs(5), || lock(&emu).mem.pc.0 == 0x202));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(lock(&emu).mem.pc.0, 0x202);
    assert_eq!(lock(&emu).regs.get(0xA), 0x7B);

    scheduler.step_once();
    assert!(wait_for(Duration::from_secs(5), || lock(&emu).mem.pc.0 == 0x204));
    assert_eq!(scheduler.snapshot().index, 0x300);

    scheduler.resume();
    assert!(wait_for(Duration::from_secs(5), || lock(&emu).mem.pc.0 == 0x218));
    scheduler.halt();
    assert_eq!(lock(&emu).regs.get(4), 15);
}
