pub mod command;
pub mod event;
pub mod ring;
pub mod state;

pub use command::WmCommand;
pub use event::WmEvent;
pub use ring::{CycleDirection, RingError, WindowRing};
pub use state::{Screen, ScreenId, ScreenSelector, StateError, StateSnapshot, Window, WmState};
