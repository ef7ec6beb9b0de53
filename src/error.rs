#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Indicates that installing or starting the USB transport failed. Fatal to
    /// interface bring-up.
    Install,
    /// Indicates that the virtual interface MAC collides with the USB link MAC.
    MacConflict,
    /// Indicates that allocating an owned copy of a frame failed. The frame is
    /// dropped; the caller decides whether to retry.
    OutOfMemory,
    /// Indicates that the transport did not accept a frame within the send
    /// timeout. A normal, transient outcome.
    Timeout,
    /// Indicates that the transport refused a frame outright. Produced by
    /// transport implementations, not by the bridge itself, which only raises
    /// `Timeout` on the send path.
    Rejected,
    /// Indicates a full table or queue.
    Exhausted,
    /// Indicates a failed discovery or name-service step. Never fatal.
    Discovery,
}

pub type Result<T> = core::result::Result<T, Error>;
