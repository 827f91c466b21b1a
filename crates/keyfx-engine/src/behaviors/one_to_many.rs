//! Fan one input out to several actions.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    Error, Result,
    action::Action,
    behavior::{Behavior, Handled},
};

/// Presses every action in order on down and releases them in the same order
/// on up.
pub struct OneToMany {
    /// Targets, in configuration order.
    actions: Vec<Action>,
    /// Set between a performed down and its up.
    triggered: Mutex<bool>,
}

impl OneToMany {
    /// Fan out to `actions`.
    pub fn new(actions: Vec<Action>) -> Result<Self> {
        if actions.is_empty() {
            return Err(Error::NoActions("one to many"));
        }
        Ok(Self {
            actions,
            triggered: Mutex::new(false),
        })
    }
}

#[async_trait]
impl Behavior for OneToMany {
    async fn down(&self) -> Handled {
        {
            let mut t = self.triggered.lock();
            if *t {
                return Handled::Ignored;
            }
            *t = true;
        }
        for a in &self.actions {
            a.press().await;
        }
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        {
            let mut t = self.triggered.lock();
            if !*t {
                return Handled::Ignored;
            }
            *t = false;
        }
        for a in &self.actions {
            a.release().await;
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "one_to_many"
    }
}
