//! Optional progress side channel. Reports never feed back into generation.

use crossbeam_channel::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Walk,
    Emit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
}

pub trait ProgressSink {
    fn report(&self, event: ProgressEvent);
}

impl ProgressSink for Sender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.send(event);
    }
}

/// Throttles reports to one every `interval` ticks, plus the final tick.
pub(crate) struct Ticker<'a> {
    sink: Option<&'a dyn ProgressSink>,
    stage: Stage,
    interval: usize,
    total: usize,
    done: usize,
}

impl<'a> Ticker<'a> {
    pub fn new(
        sink: Option<&'a dyn ProgressSink>,
        stage: Stage,
        interval: usize,
        total: usize,
    ) -> Self {
        Self {
            sink,
            stage,
            interval: interval.max(1),
            total,
            done: 0,
        }
    }

    pub fn tick(&mut self) {
        self.done += 1;
        let Some(sink) = self.sink else {
            return;
        };
        if self.done % self.interval == 0 || self.done == self.total {
            sink.report(ProgressEvent {
                stage: self.stage,
                done: self.done,
                total: self.total,
            });
        }
    }
}
