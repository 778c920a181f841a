use crate::models::session::Phase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged { from: Phase, to: Phase },
    /// Shown to the student before the automatic submission starts.
    Expired,
    CommandRejected(String),
    Notice(String),
}
