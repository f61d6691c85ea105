use std::time::Duration;

pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;

    /// Resolves once `duration` has passed; used to bound outbound calls.
    fn deadline<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        self.sleep(duration)
    }
}
