/// Client session: which conversation is active and whether an action is in flight.
///
/// `busy` is the only concurrency control in the client. Every user action
/// claims it with [`Session::try_begin`] and releases it with
/// [`Session::finish`] however the action ends.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current_chat_id: Option<String>,
    busy: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_chat_id(&self) -> Option<&str> {
        self.current_chat_id.as_deref()
    }

    pub fn is_active(&self, chat_id: &str) -> bool {
        self.current_chat_id.as_deref() == Some(chat_id)
    }

    pub fn activate(&mut self, chat_id: impl Into<String>) {
        self.current_chat_id = Some(chat_id.into());
    }

    pub fn deactivate(&mut self) {
        self.current_chat_id = None;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Claim the busy flag. Returns false if another action holds it.
    pub fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    /// Whether the composer accepts input
    pub fn input_enabled(&self) -> bool {
        self.current_chat_id.is_some() && !self.busy
    }
}
