//! Background job bookkeeping.

use std::collections::BTreeMap;
use std::fmt;

use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// A pipeline launched in the background.
///
/// The id is the process id of the pipeline's first process, which is also
/// the id of the process group every stage of the pipeline belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    id: Pid,
    name: String,
}

impl Job {
    pub fn new<S: Into<String>>(id: Pid, name: S) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> Pid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

/// Mapping from process id to job name, enumerated in ascending id order.
#[derive(Default)]
pub struct JobTable {
    jobs: BTreeMap<Pid, String>,
}

impl JobTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Tracks a new job. Returns `false`, leaving the table untouched, if a
    /// job with the same id is already tracked.
    pub fn register<S: Into<String>>(&mut self, id: Pid, name: S) -> bool {
        if self.jobs.contains_key(&id) {
            warn!("job {} is already registered", id);
            return false;
        }

        let name = name.into();
        debug!("registering job {} ({})", id, name);
        self.jobs.insert(id, name);
        true
    }

    pub fn contains(&self, id: Pid) -> bool {
        self.jobs.contains_key(&id)
    }

    pub fn get(&self, id: Pid) -> Option<Job> {
        self.jobs.get(&id).map(|name| Job::new(id, name.as_str()))
    }

    pub fn remove(&mut self, id: Pid) -> Option<Job> {
        self.jobs.remove(&id).map(|name| Job::new(id, name))
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Job> + '_ {
        self.jobs
            .iter()
            .map(|(id, name)| Job::new(*id, name.as_str()))
    }

    /// Returns every tracked job in ascending id order.
    pub fn list(&self) -> Vec<Job> {
        self.iter().collect()
    }

    /// Collects finished jobs without blocking.
    ///
    /// Every process of a job's process group that has exited is waited on.
    /// Jobs with no remaining children are removed from the table and
    /// returned.
    pub fn reap(&mut self) -> Vec<Job> {
        let finished: Vec<Pid> = self
            .jobs
            .keys()
            .cloned()
            .filter(|pgid| process_group_is_finished(*pgid))
            .collect();

        finished
            .into_iter()
            .filter_map(|pgid| self.remove(pgid))
            .inspect(|job| debug!("reaped job {} ({})", job.id(), job.name()))
            .collect()
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs", self.jobs.len())?;
        for job in self.iter() {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}

/// Waits on every exited member of the process group `pgid`.
///
/// Returns `true` once the group has no children left to wait for.
fn process_group_is_finished(pgid: Pid) -> bool {
    let group = Pid::from_raw(-pgid.as_raw());
    loop {
        match wait::waitpid(group, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => return false,
            Ok(status) => debug!("job {}: {:?}", pgid, status),
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return true,
            Err(e) => {
                error!("waitpid on job {} failed: {}", pgid, e);
                return false;
            }
        }
    }
}
