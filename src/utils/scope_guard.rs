/// Runs a closure when dropped, on every exit path of the owning scope.
pub struct ScopeGuard<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> ScopeGuard<F> {
    pub fn new(on_exit: F) -> Self {
        Self(Some(on_exit))
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(on_exit) = self.0.take() {
            on_exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn runs_on_early_return() {
        let ran = Cell::new(false);
        let exit_early = || -> Option<()> {
            let _guard = ScopeGuard::new(|| ran.set(true));
            None?;
            Some(())
        };
        assert_eq!(exit_early(), None);
        assert!(ran.get());
    }
}
