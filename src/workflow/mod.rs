//! Multi-step flow for booking a new training period.
//!
//! `Idle -> AwaitingName -> AwaitingDepot -> AwaitingVehicle -> Committing -> Idle`
//!
//! Nothing reaches the store before `commit`, and `commit` always leaves the
//! workflow idle whether or not the store accepted the period. A rejected
//! name also resets to idle; a step requested out of order is refused and
//! leaves the state untouched.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::codec;
use crate::db::PeriodStore;
use crate::errors::AppError;
use crate::models::{Depot, NewPeriod, TrainingPeriod, Vehicle};

/// Where the booking flow currently stands, with everything picked so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SelectionState {
    Idle,
    AwaitingName {
        slot: NaiveDate,
    },
    AwaitingDepot {
        slot: NaiveDate,
        name: String,
    },
    AwaitingVehicle {
        slot: NaiveDate,
        name: String,
        depot: Depot,
    },
    Committing {
        slot: NaiveDate,
        name: String,
        depot: Depot,
        vehicle: Vehicle,
    },
}

impl SelectionState {
    fn label(&self) -> &'static str {
        match self {
            SelectionState::Idle => "idle",
            SelectionState::AwaitingName { .. } => "awaiting a name",
            SelectionState::AwaitingDepot { .. } => "awaiting a depot",
            SelectionState::AwaitingVehicle { .. } => "awaiting a vehicle",
            SelectionState::Committing { .. } => "committing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionWorkflow {
    state: SelectionState,
}

impl Default for SelectionWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionWorkflow {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Idle,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SelectionState::Idle
    }

    /// An empty calendar day was picked.
    pub fn select_slot(&mut self, slot: NaiveDate) -> Result<(), AppError> {
        match self.take() {
            SelectionState::Idle => {
                self.state = SelectionState::AwaitingName { slot };
                Ok(())
            }
            other => self.refuse(other, "select a slot"),
        }
    }

    /// Accept the trainee name unless it is blank, malformed, or already in
    /// `existing` (ignoring case). A rejected name resets the flow.
    pub fn enter_name(&mut self, raw: &str, existing: &[String]) -> Result<(), AppError> {
        let slot = match self.take() {
            SelectionState::AwaitingName { slot } => slot,
            other => return self.refuse(other, "enter a name"),
        };

        let name = codec::normalize_name(raw)?;
        let key = codec::name_key(&name);
        if existing.iter().any(|taken| codec::name_key(taken) == key) {
            tracing::info!(trainee = %name, "Selection reset: trainee already exists");
            return Err(AppError::duplicate_trainee(&name));
        }

        self.state = SelectionState::AwaitingDepot { slot, name };
        Ok(())
    }

    pub fn choose_depot(&mut self, depot: Depot) -> Result<(), AppError> {
        match self.take() {
            SelectionState::AwaitingDepot { slot, name } => {
                self.state = SelectionState::AwaitingVehicle { slot, name, depot };
                Ok(())
            }
            other => self.refuse(other, "choose a depot"),
        }
    }

    pub fn choose_vehicle(&mut self, vehicle: Vehicle) -> Result<(), AppError> {
        match self.take() {
            SelectionState::AwaitingVehicle { slot, name, depot } => {
                self.state = SelectionState::Committing {
                    slot,
                    name,
                    depot,
                    vehicle,
                };
                Ok(())
            }
            other => self.refuse(other, "choose a vehicle"),
        }
    }

    /// Write the period. Returns to idle on success and on failure; there is
    /// no retry.
    pub async fn commit(&mut self, store: &dyn PeriodStore) -> Result<TrainingPeriod, AppError> {
        let (slot, name, depot, vehicle) = match self.take() {
            SelectionState::Committing {
                slot,
                name,
                depot,
                vehicle,
            } => (slot, name, depot, vehicle),
            other => {
                let err = AppError::InvalidState(format!("Cannot commit while {}", other.label()));
                self.state = other;
                return Err(err);
            }
        };

        match store
            .create_period(&NewPeriod::new(name.clone(), depot, vehicle, slot))
            .await
        {
            Ok(period) => Ok(period),
            Err(err) => {
                tracing::warn!(trainee = %name, error = %err, "Selection commit failed");
                Err(err)
            }
        }
    }

    /// Drop everything picked so far.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            tracing::debug!("Selection cancelled while {}", self.state.label());
        }
        self.state = SelectionState::Idle;
    }

    fn take(&mut self) -> SelectionState {
        std::mem::replace(&mut self.state, SelectionState::Idle)
    }

    fn refuse(&mut self, state: SelectionState, action: &str) -> Result<(), AppError> {
        let err = AppError::InvalidState(format!("Cannot {} while {}", action, state.label()));
        self.state = state;
        Err(err)
    }
}

/// How long a selection may sit untouched before it is dropped.
pub const SELECTION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Session {
    workflow: SelectionWorkflow,
    last_active: Instant,
}

impl Session {
    fn new(workflow: SelectionWorkflow) -> Self {
        Self {
            workflow,
            last_active: Instant::now(),
        }
    }
}

/// In-flight selections of all clients. A selection is forgotten as soon as
/// its workflow is idle again, or once it has been untouched for longer than
/// the TTL.
#[derive(Debug)]
pub struct SelectionSessions {
    sessions: Mutex<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl Default for SelectionSessions {
    fn default() -> Self {
        Self::new()
    }
}

/// A selection as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionView {
    pub id: Uuid,
    #[serde(flatten)]
    pub state: SelectionState,
}

impl SelectionSessions {
    pub fn new() -> Self {
        Self::with_ttl(SELECTION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Start a selection on `slot`, dropping abandoned ones first.
    pub fn start(&self, slot: NaiveDate) -> Result<SelectionView, AppError> {
        let mut workflow = SelectionWorkflow::new();
        workflow.select_slot(slot)?;

        let id = Uuid::new_v4();
        let state = workflow.state().clone();

        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_active.elapsed() < self.ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "Dropped abandoned selections");
        }
        sessions.insert(id, Session::new(workflow));

        Ok(SelectionView { id, state })
    }

    /// Run one synchronous step on a selection, dropping it if the step left
    /// it idle.
    pub fn step<F>(&self, id: Uuid, f: F) -> Result<SelectionView, AppError>
    where
        F: FnOnce(&mut SelectionWorkflow) -> Result<(), AppError>,
    {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Selection {} not found", id)))?;

        session.last_active = Instant::now();
        let result = f(&mut session.workflow);
        let state = session.workflow.state().clone();
        if session.workflow.is_idle() {
            sessions.remove(&id);
        }
        result.map(|()| SelectionView { id, state })
    }

    /// Remove a selection so it can be committed without holding the lock.
    pub fn take(&self, id: Uuid) -> Result<SelectionWorkflow, AppError> {
        self.lock()?
            .remove(&id)
            .map(|session| session.workflow)
            .ok_or_else(|| AppError::NotFound(format!("Selection {} not found", id)))
    }

    /// Put back a selection taken with [`take`](Self::take) that is still in progress.
    pub fn restore(&self, id: Uuid, workflow: SelectionWorkflow) -> Result<(), AppError> {
        if !workflow.is_idle() {
            self.lock()?.insert(id, Session::new(workflow));
        }
        Ok(())
    }

    /// Cancel a selection. Unknown ids are ignored.
    pub fn cancel(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(mut session) = self.lock()?.remove(&id) {
            session.workflow.cancel();
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Session>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("Selection registry poisoned".to_string()))
    }
}
