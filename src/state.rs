use std::time::Instant;

use crate::contact::ContactService;

// app's shared state

pub struct AppState {
    pub contact: ContactService,
    pub started_at: Instant, // for /health uptime
    pub trust_proxy: bool,   // key clients on X-Forwarded-For
}

impl AppState {
    pub fn new(contact: ContactService) -> Self {
        Self {
            contact,
            started_at: Instant::now(),
            trust_proxy: false,
        }
    }
}
