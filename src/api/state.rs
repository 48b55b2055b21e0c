use crate::advice::SleepAdvisor;
use crate::service::{SleepRecordService, SleepStatsService, UserService};
use crate::storage::Database;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub records: SleepRecordService,
    pub stats: SleepStatsService,
    pub advisor: SleepAdvisor,
}

impl AppState {
    pub fn new(db: Database, advisor: SleepAdvisor) -> Self {
        Self {
            users: UserService::new(db.clone()),
            records: SleepRecordService::new(db.clone()),
            stats: SleepStatsService::new(db),
            advisor,
        }
    }
}
