// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Post-mortem dump routines.
//!
//! The exact text here is parsed by log tooling. Don't reflow it.

use abi::CalleeSaved;

use crate::fsr::{self, FaultStatus};
use crate::log::FaultLog;
use crate::regs::FaultRegisters;

/// Describes a decoded fault status code, with the fault address where the
/// architecture defines one.
pub fn dump_fault(
    regs: &impl FaultRegisters,
    log: &mut impl FaultLog,
    status: u32,
    addr: u32,
) {
    match FaultStatus::decode(status) {
        Some(FaultStatus::DebugEvent) => dump_debug_event(regs, log),
        Some(s) if s.is_async() => fault_log!(log, "{}", s.label()),
        Some(s) => fault_log!(log, "{} @ {:#010x}", s.label(), addr),
        None => fault_log!(log, "Unknown ({})", status),
    }
}

/// Reports why the core entered debug state.
pub fn dump_debug_event(regs: &impl FaultRegisters, log: &mut impl FaultLog) {
    let moe = fsr::method_of_entry(regs.dbgdscr());
    fault_log!(log, "Debug Event ({})", fsr::debug_entry_label(moe));
}

/// Prints the registers the interrupted code had preserved. Register values
/// are only formatted, never followed.
pub fn dump_callee_saved(log: &mut impl FaultLog, cs: &CalleeSaved) {
    fault_log!(
        log,
        " r4: {:#010x}  r5:  {:#010x}  r6:  {:08x}",
        cs.r4,
        cs.r5,
        cs.r6
    );
    fault_log!(
        log,
        " r7: {:#010x}  r8:  {:#010x}  r9:  {:08x}",
        cs.r7,
        cs.r8,
        cs.r9
    );
    fault_log!(
        log,
        "r10: {:#010x} r11:  {:#010x} psp:  {:08x}",
        cs.r10,
        cs.r11,
        cs.psp
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeRegs, RecordingLog};
    use proptest::prelude::*;

    fn dump_one(status: u32, addr: u32) -> Vec<String> {
        let regs = FakeRegs::default();
        let mut log = RecordingLog::default();
        dump_fault(&regs, &mut log, status, addr);
        log.lines
    }

    #[test]
    fn synchronous_faults_carry_address() {
        let cases = [
            (0b00001, "Alignment Fault @ 0x00001234"),
            (0b00000, "Background Fault @ 0x00001234"),
            (0b01101, "Permission Fault @ 0x00001234"),
            (0b01000, "Synchronous External Abort @ 0x00001234"),
            (0b11001, "Synchronous Parity/ECC Error @ 0x00001234"),
        ];
        for (status, line) in cases {
            assert_eq!(dump_one(status, 0x1234), [line]);
        }
    }

    #[test]
    fn asynchronous_faults_omit_address() {
        assert_eq!(
            dump_one(0b10110, 0xDEAD_BEEF),
            ["Asynchronous External Abort"]
        );
        assert_eq!(
            dump_one(0b11000, 0xDEAD_BEEF),
            ["Asynchronous Parity/ECC Error"]
        );
    }

    #[test]
    fn debug_event_reads_dbgdscr() {
        let regs = FakeRegs {
            // MOE = 0b0011
            dbgdscr: 0x0000_000C,
            ..FakeRegs::default()
        };
        let mut log = RecordingLog::default();
        dump_fault(&regs, &mut log, 0b00010, 0xDEAD_BEEF);
        assert_eq!(log.lines, ["Debug Event (BKPT Instruction)"]);
    }

    #[test]
    fn callee_saved_layout() {
        let cs = CalleeSaved {
            r4: 0x4,
            r5: 0x5,
            r6: 0x6,
            r7: 0x7,
            r8: 0x8,
            r9: 0x9,
            r10: 0xA,
            r11: 0xB,
            psp: 0x2000_1FF0,
        };
        let mut log = RecordingLog::default();
        dump_callee_saved(&mut log, &cs);
        assert_eq!(
            log.lines,
            [
                " r4: 0x00000004  r5:  0x00000005  r6:  00000006",
                " r7: 0x00000007  r8:  0x00000008  r9:  00000009",
                "r10: 0x0000000a r11:  0x0000000b psp:  20001ff0",
            ]
        );
    }

    proptest! {
        #[test]
        fn unknown_codes_print_raw(status in 0u32..64, addr in any::<u32>()) {
            prop_assume!(FaultStatus::decode(status).is_none());
            prop_assert_eq!(dump_one(status, addr), [format!("Unknown ({status})")]);
        }

        #[test]
        fn address_shown_iff_synchronous(addr in any::<u32>()) {
            for status in 0u32..32 {
                let Some(s) = FaultStatus::decode(status) else {
                    continue;
                };
                if s == FaultStatus::DebugEvent {
                    continue;
                }
                let lines = dump_one(status, addr);
                let shown = lines[0].ends_with(&format!("@ {addr:#010x}"));
                prop_assert_eq!(shown, !s.is_async());
            }
        }

        #[test]
        fn garbage_registers_still_dump(words in any::<[u32; 9]>()) {
            let cs = CalleeSaved {
                r4: words[0],
                r5: words[1],
                r6: words[2],
                r7: words[3],
                r8: words[4],
                r9: words[5],
                r10: words[6],
                r11: words[7],
                psp: words[8],
            };
            let mut log = RecordingLog::default();
            dump_callee_saved(&mut log, &cs);
            prop_assert_eq!(log.lines.len(), 3);
        }
    }
}
