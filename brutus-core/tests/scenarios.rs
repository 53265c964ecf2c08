use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use brutus_core::{
    CandidateSource, Error, HashOracle, OracleError, SaltedSha1, Snapshot, Task, TaskConfig,
    TaskState, Termination, UnixCrypt, nth_candidate, partition,
};

const SALT: &[u8] = b"NaCl";
const CRYPT_SALT: &[u8] = b"$1$saltsalt$";

fn sha1(candidate: &str) -> Vec<u8> {
    SaltedSha1::new().digest(candidate, SALT).unwrap()
}

/// Polls the way an external observer would, without joining the worker.
fn poll_until_done(task: &Task, timeout: Duration) -> Snapshot {
    let deadline = Instant::now() + timeout;
    loop {
        let snapshot = task.poll();
        if snapshot.is_done() {
            return snapshot;
        }
        assert!(Instant::now() < deadline, "task {} did not finish in {timeout:?}", task.id());
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_generated_match_with_crypt() {
    let target = UnixCrypt.digest("ba", CRYPT_SALT).unwrap();
    let task = Task::create(0, 10, vec![], "ab", &target, CRYPT_SALT, UnixCrypt).unwrap();

    let snapshot = poll_until_done(&task, Duration::from_secs(30));
    assert_eq!(snapshot.password.as_deref(), Some("ba"));
    assert_eq!(snapshot.termination, Some(Termination::Matched));
    assert_eq!(task.diagnostics().unwrap().hashes_attempted, 5);
}

#[test]
fn test_word_list_match_with_crypt() {
    let target = UnixCrypt.digest("banana", CRYPT_SALT).unwrap();
    let words = vec!["apple\n".to_string(), "banana\n".to_string()];
    let task = Task::create(0, 1, words, "", &target, CRYPT_SALT, UnixCrypt).unwrap();

    let snapshot = poll_until_done(&task, Duration::from_secs(30));
    assert_eq!(snapshot.state, TaskState::Done);
    assert_eq!(snapshot.password.as_deref(), Some("banana"));
    assert_eq!(task.diagnostics().unwrap().hashes_attempted, 2);
}

#[test]
fn test_unmatched_range_is_exhausted() {
    let task = Task::create(0, 3, vec![], "x", &sha1("y"), SALT, SaltedSha1::new()).unwrap();

    let snapshot = poll_until_done(&task, Duration::from_secs(10));
    assert_eq!(snapshot.state, TaskState::Done);
    assert_eq!(snapshot.password, None);
    assert_eq!(snapshot.termination, Some(Termination::Exhausted));
    // stop is left at its configured value.
    assert_eq!(task.diagnostics().unwrap().hashes_attempted, 4);
}

#[test]
fn test_match_in_offset_range() {
    let charset: Vec<char> = "abcdef".chars().collect();
    let m = 777;
    let target = sha1(&nth_candidate(m, &charset));
    let config =
        TaskConfig::new(500, 2000, CandidateSource::Charset(charset.clone()), target, SALT);
    let task = Task::spawn(config, SaltedSha1::new()).unwrap();

    let snapshot = poll_until_done(&task, Duration::from_secs(10));
    assert_eq!(snapshot.password, Some(nth_candidate(m, &charset)));
    assert_eq!(task.diagnostics().unwrap().hashes_attempted, m - 500 + 1);
}

#[test]
fn test_long_range_cancelled_quickly() {
    let task =
        Task::create(0, u64::MAX, vec![], "abcdef", &sha1("no"), SALT, SaltedSha1::new()).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    assert!(task.cancel());

    let snapshot = poll_until_done(&task, Duration::from_secs(10));
    assert_eq!(snapshot.state, TaskState::Done);
    assert_eq!(snapshot.password, None);
    assert_eq!(snapshot.termination, Some(Termination::Cancelled));

    let diagnostics = task.diagnostics().unwrap();
    assert!(diagnostics.elapsed_seconds < 10.0);
    assert!(!task.cancel());
}

#[test]
fn test_diagnostics_before_done() {
    let task =
        Task::create(0, u64::MAX, vec![], "ab", &sha1("no"), SALT, SaltedSha1::new()).unwrap();
    assert!(matches!(task.diagnostics(), Err(Error::NotDone)));
    task.cancel();
    task.wait();
    assert!(task.diagnostics().is_ok());
}

#[test]
fn test_state_never_regresses_across_observers() {
    let target = sha1(&nth_candidate(20_000, &['0', '1', '2']));
    let task = Arc::new(
        Task::create(0, 50_000, vec![], "012", &target, SALT, SaltedSha1::new()).unwrap(),
    );

    let observers: Vec<_> = (0..4)
        .map(|_| {
            let task = Arc::clone(&task);
            std::thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    let snapshot = task.poll();
                    assert_ne!(snapshot.state, TaskState::Uninitialized);
                    if let Some(last) = seen.last() {
                        assert!(snapshot.state >= *last, "state regressed");
                    }
                    seen.push(snapshot.state);
                    if snapshot.is_done() {
                        // Result and termination become visible together with Done.
                        assert!(snapshot.password.is_some());
                        assert_eq!(snapshot.termination, Some(Termination::Matched));
                        return snapshot;
                    }
                    assert_eq!(snapshot.password, None);
                }
            })
        })
        .collect();

    for observer in observers {
        let snapshot = observer.join().unwrap();
        assert_eq!(snapshot.password, Some(nth_candidate(20_000, &['0', '1', '2'])));
    }
    assert_eq!(task.diagnostics().unwrap().hashes_attempted, 20_001);
}

/// Counts how many oracles have been dropped, to observe worker teardown.
struct DropCounting {
    inner: SaltedSha1,
    dropped: Arc<AtomicUsize>,
}

impl HashOracle for DropCounting {
    fn digest_into(
        &mut self,
        candidate: &str,
        salt: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), OracleError> {
        self.inner.digest_into(candidate, salt, out)
    }
}

impl Drop for DropCounting {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_repeated_create_cancel_cycles() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let cycles = 200;

    for i in 0..cycles {
        let oracle = DropCounting { inner: SaltedSha1::new(), dropped: Arc::clone(&dropped) };
        let task = if i % 2 == 0 {
            let task =
                Task::create(0, u64::MAX, vec![], "abc", &sha1("zzz"), SALT, oracle).unwrap();
            assert!(task.cancel());
            task
        } else {
            let words: Vec<String> = (0..64).map(|w| format!("word{w}\n")).collect();
            let task = Task::create(0, 63, words, "", &sha1("none"), SALT, oracle).unwrap();
            // Some of these finish before the request lands.
            if i % 3 != 0 {
                task.cancel();
            }
            task
        };

        let snapshot = task.wait();
        assert_eq!(snapshot.state, TaskState::Done);
        assert_eq!(snapshot.password, None);
        assert!(matches!(
            snapshot.termination,
            Some(Termination::Cancelled | Termination::Exhausted)
        ));
    }

    assert_eq!(dropped.load(Ordering::SeqCst), cycles);
}

#[test]
fn test_partitioned_tasks_find_single_match() {
    let charset: Vec<char> = "abcd".chars().collect();
    let m = 3_333;
    let target = sha1(&nth_candidate(m, &charset));

    let tasks: Vec<Task> = partition(0, 10_000, 4)
        .into_iter()
        .map(|range| {
            let config = TaskConfig::new(
                *range.start(),
                *range.end(),
                CandidateSource::Charset(charset.clone()),
                target.clone(),
                SALT,
            );
            Task::spawn(config, SaltedSha1::new()).unwrap()
        })
        .collect();

    let found: Vec<String> = tasks.iter().filter_map(|task| task.wait().password).collect();
    assert_eq!(found, vec![nth_candidate(m, &charset)]);
}
