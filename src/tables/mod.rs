pub mod request;
pub mod table;

/// Anything that emits timed exits into the network.
pub trait EventSource {
    type Exit;

    fn update_time(&mut self, time: f64);
    fn read_next_exit(&self) -> Option<f64>;
    fn pop_next_exit(&mut self) -> Option<(f64, Self::Exit)>;
}
