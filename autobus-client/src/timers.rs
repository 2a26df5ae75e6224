use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use autobus_types::RoomCode;

use crate::session::SessionShared;

pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// The two background timers of a session. At most one of each runs; both
/// are aborted together on [`TimerSet::cancel`] and on drop.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    poller: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

impl TimerSet {
    pub fn cancel(&mut self) {
        for handle in [self.poller.take(), self.countdown.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }

    /// Replace whatever is running with a countdown and, when online, a poller.
    pub fn start(&mut self, shared: &Arc<SessionShared>, epoch: u64, room_code: Option<RoomCode>) {
        self.cancel();
        self.countdown = Some(spawn_countdown(shared.clone(), epoch));
        self.poller = room_code.map(|code| spawn_poller(shared.clone(), epoch, code));
    }

    pub fn is_running(&self) -> bool {
        [&self.poller, &self.countdown]
            .into_iter()
            .flatten()
            .any(|handle| !handle.is_finished())
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Fetches the room immediately, then every poll interval.
fn spawn_poller(shared: Arc<SessionShared>, epoch: u64, room_code: RoomCode) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(shared.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let ControlFlow::Break(()) = shared.poll_once(epoch, &room_code).await {
                break;
            }
        }
    })
}

fn spawn_countdown(shared: Arc<SessionShared>, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let ControlFlow::Break(()) = shared.tick(epoch).await {
                break;
            }
        }
    })
}
