use std::mem;

use tracing::debug;

use crate::error::{Result, SpoolerError};
use crate::spooler::index::IdIndex;
use crate::spooler::job::{clamp_priority, format_job_id, id_sequence, Job, JobKind, JobStatus};
use crate::spooler::store::JobRecord;

/// Array-backed binary min-heap of jobs keyed by priority, with an id index
/// that tracks where every job currently sits.
///
/// Every mutating operation keeps two invariants:
/// - `jobs` satisfies the min-heap property on `priority`
/// - for every slot `i`, `index.find(jobs[i].id) == Some(i)`, and the index
///   holds no other entries
#[derive(Debug)]
pub struct JobHeap {
    jobs: Vec<Job>,
    index: IdIndex,
    next_seq: u64,
    capacity: Option<usize>,
}

impl JobHeap {
    /// Empty scheduler whose first generated id uses sequence `next_seq`.
    ///
    /// `capacity` of `None` means the heap grows on demand.
    pub fn new(next_seq: u64, capacity: Option<usize>) -> Self {
        Self {
            jobs: Vec::new(),
            index: IdIndex::new(),
            next_seq: next_seq.max(1),
            capacity,
        }
    }

    /// Rebuild a scheduler from persisted records, keeping their ids and
    /// statuses. The id counter is seeded past the largest numeric suffix seen.
    pub fn restore<I>(records: I, capacity: Option<usize>) -> Result<Self>
    where
        I: IntoIterator<Item = JobRecord>,
    {
        let mut heap = Self::new(1, capacity);
        let mut max_seq = 0;
        let mut max_id = String::new();

        for record in records {
            if let Some(seq) = id_sequence(&record.id) {
                if seq >= max_seq {
                    max_seq = seq;
                    max_id.clone_from(&record.id);
                }
            }
            let job = Job::new(
                record.id,
                record.kind,
                clamp_priority(record.priority),
                record.status,
            );
            heap.push(job)?;
        }

        heap.next_seq = max_seq
            .checked_add(1)
            .ok_or(SpoolerError::SequenceExhausted(max_id))?;
        debug!(
            "Restored {} jobs, next sequence {}",
            heap.jobs.len(),
            heap.next_seq
        );
        Ok(heap)
    }

    /// Create a queued job with a fresh id and schedule it.
    ///
    /// Out-of-range priorities are clamped, never rejected.
    pub fn insert(&mut self, kind: JobKind, priority: i64) -> Result<Job> {
        self.ensure_room()?;

        let id = format_job_id(kind, self.next_seq);
        let following = self
            .next_seq
            .checked_add(1)
            .ok_or_else(|| SpoolerError::SequenceExhausted(id.clone()))?;
        let job = Job::new(id, kind, clamp_priority(priority), JobStatus::Queued);
        let created = job.clone();

        self.push(job)?;
        self.next_seq = following;

        debug!("Inserted job {} with priority {}", created.id, created.priority);
        Ok(created)
    }

    /// Root of the heap, the most urgent job regardless of status
    pub fn peek(&self) -> Option<&Job> {
        self.jobs.first()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sequence number the next generated id will carry
    pub fn next_sequence(&self) -> u64 {
        self.next_seq
    }

    /// Number of jobs whose status has the same variant as `status`.
    /// Delay reasons are not compared.
    pub fn count_by_status(&self, status: &JobStatus) -> usize {
        let wanted = mem::discriminant(status);
        self.jobs
            .iter()
            .filter(|job| mem::discriminant(&job.status) == wanted)
            .count()
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Job> {
        let pos = self.position_of(id)?;
        Ok(&self.jobs[pos])
    }

    /// Cancel a job. The structure is untouched when the id is unknown.
    pub fn remove_by_id(&mut self, id: &str) -> Result<Job> {
        let pos = self.position_of(id)?;
        let removed = self.remove_at(pos);
        debug!("Removed job {} from slot {}", removed.id, pos);
        Ok(removed)
    }

    /// Change a job's priority and move it to its new place in the heap
    pub fn update_priority(&mut self, id: &str, priority: i64) -> Result<Job> {
        let pos = self.position_of(id)?;
        let priority = clamp_priority(priority);

        self.jobs[pos].priority = priority;
        self.sift_up(pos);
        self.sift_down(pos);

        debug!("Job {} priority set to {}", id, priority);
        self.find_by_id(id).cloned()
    }

    /// Change a job's status. Status does not take part in heap order, so the
    /// job keeps its slot.
    pub fn update_status(&mut self, id: &str, status: JobStatus) -> Result<Job> {
        let pos = self.position_of(id)?;
        debug!("Job {} status {} -> {}", id, self.jobs[pos].status, status);
        self.jobs[pos].status = status;
        Ok(self.jobs[pos].clone())
    }

    /// Take the most urgent queued job out of the scheduler.
    ///
    /// Delayed jobs are skipped even when they sit at the root. Among queued
    /// jobs sharing the lowest priority, the one earliest in the array wins.
    pub fn extract_next(&mut self) -> Option<Job> {
        let pos = self
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.status.is_eligible())
            .min_by_key(|(pos, job)| (job.priority, *pos))
            .map(|(pos, _)| pos)?;

        let job = self.remove_at(pos);
        debug!("Extracted job {} (priority {})", job.id, job.priority);
        Some(job)
    }

    /// Copies of all jobs in array order. The order carries no meaning beyond
    /// the heap layout.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.clone()
    }

    /// Copies of all jobs sorted by priority, for listings
    pub fn by_priority(&self) -> Vec<Job> {
        let mut jobs = self.snapshot();
        jobs.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    /// Drop every job and return how many were held. The id counter keeps
    /// counting.
    pub fn clear(&mut self) -> usize {
        let dropped = self.jobs.len();
        self.jobs.clear();
        self.index.clear();
        debug!("Cleared {} jobs", dropped);
        dropped
    }

    /// Walk the whole structure and report the first broken invariant.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (pos, job) in self.jobs.iter().enumerate() {
            if pos > 0 {
                let parent = (pos - 1) / 2;
                if self.jobs[parent].priority > job.priority {
                    return Err(format!(
                        "slot {} (priority {}) is above its parent slot {} (priority {})",
                        pos, job.priority, parent, self.jobs[parent].priority
                    ));
                }
            }
            match self.index.find(&job.id) {
                Some(indexed) if indexed == pos => {}
                other => {
                    return Err(format!(
                        "job {} sits in slot {} but the index says {:?}",
                        job.id, pos, other
                    ))
                }
            }
        }
        if self.index.len() != self.jobs.len() {
            return Err(format!(
                "index tracks {} ids for {} jobs",
                self.index.len(),
                self.jobs.len()
            ));
        }
        Ok(())
    }

    fn ensure_room(&self) -> Result<()> {
        match self.capacity {
            Some(max) if self.jobs.len() >= max => Err(SpoolerError::CapacityExceeded(max)),
            _ => Ok(()),
        }
    }

    fn position_of(&self, id: &str) -> Result<usize> {
        self.index
            .find(id)
            .ok_or_else(|| SpoolerError::NotFound(id.to_string()))
    }

    /// Append a job at the end, register it, and sift it into place
    fn push(&mut self, job: Job) -> Result<()> {
        self.ensure_room()?;
        let pos = self.jobs.len();
        self.index.insert(&job.id, pos)?;
        self.jobs.push(job);
        self.sift_up(pos);
        Ok(())
    }

    /// Remove the job in slot `pos` by moving the last job into its place.
    ///
    /// The job moved into `pos` came from the end of a valid heap, so at most
    /// one of the two sifts has any effect. Running both keeps us from
    /// deciding which.
    fn remove_at(&mut self, pos: usize) -> Job {
        let removed = self.jobs.swap_remove(pos);
        self.index.remove(&removed.id);

        if pos < self.jobs.len() {
            self.index.update(&self.jobs[pos].id, pos);
            self.sift_up(pos);
            self.sift_down(pos);
        }
        removed
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.jobs.swap(a, b);
        self.index.update(&self.jobs[a].id, a);
        self.index.update(&self.jobs[b].id, b);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.jobs[pos].priority < self.jobs[parent].priority {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.jobs.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.jobs[left].priority < self.jobs[smallest].priority {
                smallest = left;
            }
            if right < len && self.jobs[right].priority < self.jobs[smallest].priority {
                smallest = right;
            }

            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}

impl Default for JobHeap {
    fn default() -> Self {
        Self::new(1, None)
    }
}
