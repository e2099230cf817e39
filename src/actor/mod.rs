//! Channel plumbing shared by the message producers and the dispatcher.

pub mod replay;
pub mod wm_controller;

pub type Sender<T> = crossbeam_channel::Sender<T>;
pub type Receiver<T> = crossbeam_channel::Receiver<T>;

/// An unbounded multi-producer/single-consumer channel. The native hook and
/// the hotkey listener share the sending side; the dispatcher owns the
/// receiving side.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) { crossbeam_channel::unbounded() }
