//! Paging gate for feeds whose end-of-pages is signalled by stream completion.

/// Whether next-page requests are currently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageGate {
    /// Initial data not loaded yet, or a page fetch is in flight.
    #[default]
    Closed,
    Open,
    /// The page source completed; paging never resumes for this presenter.
    Exhausted,
}

impl PageGate {
    pub fn is_open(self) -> bool {
        self == PageGate::Open
    }

    pub fn is_exhausted(self) -> bool {
        self == PageGate::Exhausted
    }

    /// Opens the gate unless paging has permanently ended.
    pub fn open(&mut self) {
        if !self.is_exhausted() {
            *self = PageGate::Open;
        }
    }

    /// Closes the gate for an in-flight fetch. Returns false when the gate
    /// was not open, meaning the request must be rejected.
    pub fn try_close(&mut self) -> bool {
        if self.is_open() {
            *self = PageGate::Closed;
            true
        } else {
            false
        }
    }

    pub fn exhaust(&mut self) {
        *self = PageGate::Exhausted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        assert_eq!(PageGate::default(), PageGate::Closed);
    }

    #[test]
    fn try_close_only_accepts_open_gate() {
        let mut gate = PageGate::Closed;
        assert!(!gate.try_close());

        gate.open();
        assert!(gate.try_close());
        assert_eq!(gate, PageGate::Closed);
        assert!(!gate.try_close());
    }

    #[test]
    fn exhausted_gate_never_reopens() {
        let mut gate = PageGate::Open;
        gate.exhaust();
        gate.open();

        assert!(gate.is_exhausted());
        assert!(!gate.try_close());
    }
}
