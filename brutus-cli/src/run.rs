use std::ops::RangeInclusive;
use std::time::Duration;

use brutus_core::{
    CandidateSource, Snapshot, Task, TaskConfig, Termination, candidate_length, partition,
};
use indicatif::ProgressBar;
use tokio::time::Instant;

use crate::error::Error;
use crate::scheme::Scheme;

/// A search split across several tasks.
///
/// A charset is cloned into every task. A word list is split along the
/// partition ranges, so each task owns only the words it will test.
#[derive(Debug, Clone)]
pub struct Plan {
    pub start: u64,
    pub stop: u64,
    pub source: CandidateSource,
    pub target: Vec<u8>,
    pub salt: Vec<u8>,
    pub scheme: Scheme,
    pub max_candidate_len: usize,
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub password: Option<String>,
    pub timed_out: bool,
    /// Longest elapsed time of any task.
    pub elapsed_seconds: f64,
    /// Hashes computed by tasks that ran to a match or to the end of their
    /// range. Cancelled tasks are not counted.
    pub hashes_attempted: u64,
}

/// Spawn one task per partition of the plan's range and poll them until all
/// are done. The first match, the first failure or the timeout cancels every
/// remaining task.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(start = plan.start, stop = plan.stop, workers = plan.workers)
)]
pub async fn run(
    plan: Plan,
    poll_interval: Duration,
    timeout: Option<Duration>,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Task>, Error> {
    if stop_exceeds_max_len(&plan) {
        tracing::warn!(
            max_len = plan.max_candidate_len,
            "candidates near the end of the range are longer than the maximum, \
             the search fails if it gets that far"
        );
    }
    let tasks = spawn_tasks(&plan)?;
    tracing::info!(tasks = tasks.len(), scheme = ?plan.scheme, "search started");

    let deadline = timeout.map(|t| Instant::now() + t);
    let mut stopping = false;

    loop {
        let snapshots: Vec<Snapshot> = tasks.iter().map(Task::poll).collect();
        let running = snapshots.iter().filter(|s| !s.is_done()).count();

        if let Some(pb) = progress {
            pb.set_message(format!("{running}/{} workers running", tasks.len()));
        }
        if running == 0 {
            break;
        }

        if !stopping {
            let matched = snapshots.iter().any(|s| s.password.is_some());
            let failed = snapshots
                .iter()
                .any(|s| matches!(s.termination, Some(Termination::Failed(_))));
            let expired = deadline.is_some_and(|d| Instant::now() >= d);

            if matched || failed || expired {
                tracing::debug!(matched, failed, expired, "cancelling remaining tasks");
                for task in &tasks {
                    task.cancel();
                }
                stopping = true;
            }
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(tasks)
}

fn spawn_tasks(plan: &Plan) -> Result<Vec<Task>, Error> {
    partition(plan.start, plan.stop, plan.workers)
        .into_iter()
        .map(|range| {
            let (start, stop, source) = task_source(&plan.source, range)?;
            let config =
                TaskConfig::new(start, stop, source, plan.target.clone(), plan.salt.clone())
                    .max_candidate_len(plan.max_candidate_len);
            Ok(Task::spawn(config, plan.scheme.oracle())?)
        })
        .collect()
}

/// The range and candidates for one partition. Word-list ranges are rebased
/// onto the task's own slice.
fn task_source(
    source: &CandidateSource,
    range: RangeInclusive<u64>,
) -> Result<(u64, u64, CandidateSource), Error> {
    match source {
        CandidateSource::Charset(charset) => {
            Ok((*range.start(), *range.end(), CandidateSource::Charset(charset.clone())))
        }
        CandidateSource::WordList(words) => {
            let past_end = brutus_core::Error::InvalidArgument {
                reason: "stop is past the end of the word list",
            };
            let (Ok(lo), Ok(hi)) = (usize::try_from(*range.start()), usize::try_from(*range.end()))
            else {
                return Err(past_end.into());
            };
            let slice = words.get(lo..=hi).ok_or(past_end)?;
            Ok((0, (hi - lo) as u64, CandidateSource::WordList(slice.to_vec())))
        }
    }
}

fn stop_exceeds_max_len(plan: &Plan) -> bool {
    match &plan.source {
        CandidateSource::Charset(charset) if !charset.is_empty() => {
            candidate_length(plan.stop, charset.len()) > plan.max_candidate_len as u64
        }
        _ => false,
    }
}

/// Index of the last candidate with at most `max_len` characters over a
/// charset of `charset_len` characters, saturating at `u64::MAX`.
pub fn last_index_within(charset_len: usize, max_len: usize) -> u64 {
    let k = charset_len as u64;
    // S(max_len + 1) - 1
    let mut total = 0u64;
    let mut width = 1u64;
    for _ in 0..=max_len {
        total = match total.checked_add(width) {
            Some(total) => total,
            None => return u64::MAX,
        };
        width = width.saturating_mul(k);
    }
    total - 1
}

/// Summarize finished tasks. Fails with the first worker failure unless some
/// task found the password.
pub fn summarize(tasks: &[Task]) -> Result<Report, Error> {
    let mut password = None;
    let mut timed_out = false;
    let mut first_error: Option<Error> = None;
    let mut elapsed_seconds = 0f64;
    let mut hashes_attempted = 0u64;

    for task in tasks {
        let snapshot = task.poll();
        let diagnostics = task.diagnostics()?;
        elapsed_seconds = elapsed_seconds.max(diagnostics.elapsed_seconds);

        match snapshot.termination {
            Some(Termination::Matched) => {
                hashes_attempted = hashes_attempted.saturating_add(diagnostics.hashes_attempted);
                if password.is_none() {
                    password = snapshot.password;
                }
            }
            Some(Termination::Exhausted) => {
                hashes_attempted = hashes_attempted.saturating_add(diagnostics.hashes_attempted);
            }
            Some(Termination::Cancelled) => timed_out = true,
            Some(Termination::Failed(reason)) => {
                if first_error.is_none() {
                    first_error = Some(Error::TaskFailed { task: task.id(), reason });
                }
            }
            None => return Err(brutus_core::Error::NotDone.into()),
        }
    }

    if password.is_none() {
        if let Some(e) = first_error {
            return Err(e);
        }
    } else {
        // Tasks cancelled after a match did not time out.
        timed_out = false;
    }

    Ok(Report { password, timed_out, elapsed_seconds, hashes_attempted })
}

#[cfg(test)]
mod tests {
    use brutus_core::{HashOracle, SaltedSha1, nth_candidate};

    use super::*;

    const SALT: &[u8] = b"NaCl";

    fn plan(source: CandidateSource, target: Vec<u8>, stop: u64, workers: usize) -> Plan {
        Plan {
            start: 0,
            stop,
            source,
            target,
            salt: SALT.to_vec(),
            scheme: Scheme::Sha1,
            max_candidate_len: 64,
            workers,
        }
    }

    #[test]
    fn test_last_index_within() {
        // "", a, b, aa, ba, ab, bb
        assert_eq!(last_index_within(2, 2), 6);
        assert_eq!(nth_candidate(6, &['a', 'b']), "bb");
        assert_eq!(nth_candidate(7, &['a', 'b']), "aaa");
        assert_eq!(last_index_within(1, 5), 5);
        assert_eq!(last_index_within(2, 64), u64::MAX);
        assert_eq!(last_index_within(26, 128), u64::MAX);
        assert_eq!(last_index_within(10, 0), 0);
    }

    #[tokio::test]
    async fn test_parallel_search_finds_match() {
        let charset: Vec<char> = "abc".chars().collect();
        let expected = nth_candidate(5_000, &charset);
        let target = SaltedSha1::new().digest(&expected, SALT).unwrap();

        let tasks = run(
            plan(CandidateSource::Charset(charset), target, 1_000_000, 4),
            Duration::from_millis(5),
            None,
            None,
        )
        .await
        .unwrap();
        let report = summarize(&tasks).unwrap();

        assert_eq!(report.password, Some(expected));
        assert!(!report.timed_out);
        assert!(report.hashes_attempted >= 1);
    }

    #[tokio::test]
    async fn test_word_list_exhausted() {
        let words = vec!["apple\n".to_string(), "banana\n".to_string(), "cherry".to_string()];
        let target = SaltedSha1::new().digest("durian", SALT).unwrap();

        let tasks = run(
            plan(CandidateSource::WordList(words), target, 2, 2),
            Duration::from_millis(5),
            None,
            None,
        )
        .await
        .unwrap();
        let report = summarize(&tasks).unwrap();

        assert_eq!(report.password, None);
        assert!(!report.timed_out);
        assert_eq!(report.hashes_attempted, 3);
    }

    #[test]
    fn test_stop_exceeds_max_len() {
        let target = SaltedSha1::new().digest("x", SALT).unwrap();
        let mut generated = plan(CandidateSource::Charset(vec!['a', 'b']), target.clone(), 6, 1);
        generated.max_candidate_len = 2;
        assert!(!stop_exceeds_max_len(&generated));
        generated.stop = 7;
        assert!(stop_exceeds_max_len(&generated));

        let words = plan(CandidateSource::WordList(vec!["a\n".into()]), target, 0, 1);
        assert!(!stop_exceeds_max_len(&words));
    }

    #[test]
    fn test_word_list_split_per_task() {
        let words: Vec<String> = (0..10).map(|w| format!("word{w}\n")).collect();
        let source = CandidateSource::WordList(words);

        let (start, stop, slice) = task_source(&source, 4..=6).unwrap();
        assert_eq!((start, stop), (0, 2));
        assert_eq!(
            slice,
            CandidateSource::WordList(vec!["word4\n".into(), "word5\n".into(), "word6\n".into()])
        );

        let err = task_source(&source, 8..=10).unwrap_err();
        assert!(matches!(err, Error::Search(brutus_core::Error::InvalidArgument { .. })));

        let charset = CandidateSource::Charset(vec!['a', 'b']);
        assert_eq!(task_source(&charset, 4..=6).unwrap(), (4, 6, charset.clone()));
    }

    #[tokio::test]
    async fn test_word_list_match_in_last_partition() {
        let words: Vec<String> = (0..12).map(|w| format!("word{w}\n")).collect();
        let target = SaltedSha1::new().digest("word10", SALT).unwrap();

        let tasks = run(
            plan(CandidateSource::WordList(words), target, 11, 3),
            Duration::from_millis(5),
            None,
            None,
        )
        .await
        .unwrap();
        let report = summarize(&tasks).unwrap();

        assert_eq!(report.password.as_deref(), Some("word10"));
        assert!(!report.timed_out);
    }

    #[tokio::test]
    async fn test_timeout_cancels_all_tasks() {
        let target = SaltedSha1::new().digest("never", SALT).unwrap();
        let tasks = run(
            plan(CandidateSource::Charset(vec!['a', 'b']), target, u64::MAX, 2),
            Duration::from_millis(5),
            Some(Duration::from_millis(50)),
            None,
        )
        .await
        .unwrap();
        let report = summarize(&tasks).unwrap();

        assert_eq!(report.password, None);
        assert!(report.timed_out);
        assert!(tasks.iter().all(|t| t.poll().termination == Some(Termination::Cancelled)));
    }

    #[tokio::test]
    async fn test_worker_failure_is_reported() {
        let mut failing = plan(CandidateSource::Charset(vec!['a']), b"$1$x".to_vec(), 3, 1);
        failing.scheme = Scheme::Crypt;
        failing.salt = vec![0xff];

        let tasks = run(failing, Duration::from_millis(5), None, None).await.unwrap();
        assert!(matches!(summarize(&tasks), Err(Error::TaskFailed { .. })));
    }

    #[tokio::test]
    async fn test_invalid_plan_spawns_nothing() {
        let target = SaltedSha1::new().digest("x", SALT).unwrap();
        let mut invalid = plan(CandidateSource::Charset(vec![]), target, 3, 2);
        invalid.workers = 3;

        let err = run(invalid, Duration::from_millis(5), None, None).await.unwrap_err();
        assert!(matches!(err, Error::Search(brutus_core::Error::InvalidArgument { .. })));
    }
}
