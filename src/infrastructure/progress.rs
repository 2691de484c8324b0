/// In-memory progress store.
/// Uses DashMap so concurrent server connections can update and poll jobs.

use dashmap::DashMap;

use crate::ports::{JobStatus, Progress, ProgressStore};

#[derive(Default)]
pub struct MemoryProgressStore {
    jobs: DashMap<String, Progress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn begin(&self, job: &str, total_files: usize) {
        self.jobs.insert(
            job.to_string(),
            Progress {
                status: JobStatus::Processing,
                percent: 0,
                current_file: String::new(),
                current_index: 0,
                total_files,
                error: None,
            },
        );
    }

    fn advance(&self, job: &str, index: usize, current_file: &str) {
        if let Some(mut progress) = self.jobs.get_mut(job) {
            progress.current_index = index + 1;
            progress.current_file = current_file.to_string();
            progress.percent = if progress.total_files == 0 {
                0
            } else {
                (index * 100 / progress.total_files).min(99) as u8
            };
        }
    }

    fn complete(&self, job: &str) {
        if let Some(mut progress) = self.jobs.get_mut(job) {
            progress.status = JobStatus::Complete;
            progress.percent = 100;
        }
    }

    fn fail(&self, job: &str, error: &str) {
        let mut progress = self.jobs.entry(job.to_string()).or_insert_with(|| Progress {
            status: JobStatus::Failed,
            percent: 0,
            current_file: String::new(),
            current_index: 0,
            total_files: 0,
            error: None,
        });
        progress.status = JobStatus::Failed;
        progress.percent = 100;
        progress.error = Some(error.to_string());
    }

    fn get(&self, job: &str) -> Option<Progress> {
        self.jobs.get(job).map(|r| r.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle() {
        let store = MemoryProgressStore::new();
        store.begin("job1", 4);
        store.advance("job1", 0, "a.py");
        store.advance("job1", 2, "c.py");

        let progress = store.get("job1").unwrap();
        assert_eq!(progress.status, JobStatus::Processing);
        assert_eq!(progress.current_index, 3);
        assert_eq!(progress.current_file, "c.py");
        assert_eq!(progress.percent, 50);

        store.complete("job1");
        let progress = store.get("job1").unwrap();
        assert_eq!(progress.status, JobStatus::Complete);
        assert_eq!(progress.percent, 100);
    }

    #[test]
    fn test_unknown_job() {
        let store = MemoryProgressStore::new();
        store.advance("nope", 1, "x.py");
        assert!(store.get("nope").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_fail_records_error() {
        let store = MemoryProgressStore::new();
        store.fail("job2", "Project root not found");
        let progress = store.get("job2").unwrap();
        assert_eq!(progress.status, JobStatus::Failed);
        assert_eq!(progress.error.as_deref(), Some("Project root not found"));
    }
}
