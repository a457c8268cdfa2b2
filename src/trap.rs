//! The closed trap taxonomy (spec §7) and the trap state the architectural
//! core carries.

/// Every trap kind the core can raise, plus the kinds a richer backend could
/// use (interrupts, page faults) that this core never raises itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    InstructionAddressMisaligned,
    InstructionAccessFault,
    IllegalInstruction,
    Breakpoint,
    LoadAddressMisaligned,
    LoadAccessFault,
    StoreAddressMisaligned,
    StoreAccessFault,
    EnvironmentCallFromMMode,
    InstructionPageFault,
    LoadPageFault,
    StorePageFault,
    MachineSoftwareInterrupt,
    MachineTimerInterrupt,
    MachineExternalInterrupt,
}

/// A raised trap: its kind, and a payload whose meaning depends on the kind
/// (the offending instruction word for `IllegalInstruction`, the offending
/// address for access/misaligned faults, unused otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapState {
    pub kind: TrapKind,
    pub context: u32,
}
