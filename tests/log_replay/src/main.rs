fn main() {
    println!("Run `cargo test -p log-replay` to replay the client log fixtures.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bloxpresence_game_log::{LogTailer, TailOptions};
    use bloxpresence_presence::{
        Activity, ActivityPublisher, PresenceOptions, PresenceTracker,
    };
    use bloxpresence_session::{
        PendingTeleport, PresenceError, ServerType, SessionError, SessionRecord,
        SessionStateMachine,
    };

    /// Publisher that remembers everything it was asked to show.
    #[derive(Debug, Default)]
    struct RecordingPublisher {
        published: Vec<Option<Activity>>,
    }

    impl ActivityPublisher for RecordingPublisher {
        fn set_activity(&mut self, activity: &Activity) -> Result<(), PresenceError> {
            self.published.push(Some(activity.clone()));
            Ok(())
        }

        fn clear_activity(&mut self) -> Result<(), PresenceError> {
            self.published.push(None);
            Ok(())
        }
    }

    type Machine = SessionStateMachine<PresenceTracker<RecordingPublisher>>;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture log file.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn machine() -> Machine {
        SessionStateMachine::new(PresenceTracker::new(
            RecordingPublisher::default(),
            PresenceOptions::default(),
        ))
    }

    /// Replays lines through a fresh machine, collecting handling errors.
    fn replay<'a>(lines: impl IntoIterator<Item = &'a str>) -> (Machine, Vec<SessionError>) {
        let mut m = machine();
        let mut errors = Vec::new();
        for line in lines {
            if let Err(e) = m.handle_line(line) {
                errors.push(e);
            }
        }
        (m, errors)
    }

    fn replay_fixture(name: &str) -> (Machine, Vec<SessionError>) {
        let content = load_fixture(name);
        let (m, errors) = replay(content.lines());
        (m, errors)
    }

    fn published(m: &Machine) -> &[Option<Activity>] {
        &m.sink().publisher().published
    }

    #[test]
    fn public_session() {
        let (m, errors) = replay_fixture("public_session.log");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(m.record(), SessionRecord::default());

        let published = published(&m);
        assert_eq!(published.len(), 4);

        let joined = published[0].as_ref().unwrap();
        assert_eq!(joined.details, "Playing place 1818");
        assert_eq!(joined.state, "Public server");
        assert!(joined.buttons.iter().any(|b| b.url
            == "roblox://experiences/start?placeId=1818&gameInstanceId=3f2504e0-4f89-11d3-9a0c-0305e82c3301"));

        let custom = published[1].as_ref().unwrap();
        assert_eq!(custom.details, "Classic Crossroads");
        assert_eq!(custom.state, "Round 3");
        let large = custom.large_image.as_ref().unwrap();
        assert_eq!(large.key, "https://assetdelivery.roblox.com/v1/asset/?id=1818");
        assert_eq!(large.text, "Crossroads");

        let reset = published[2].as_ref().unwrap();
        assert_eq!(reset.details, "Classic Crossroads");
        assert_eq!(reset.state, "Public server");

        assert!(published[3].is_none());
    }

    #[test]
    fn public_session_in_progress() {
        let content = load_fixture("public_session.log");
        let lines: Vec<&str> = content.lines().collect();
        let (m, _) = replay(lines[..6].iter().copied());

        let record = m.record();
        assert!(record.in_game);
        assert_eq!(record.place_id, "1818");
        assert_eq!(record.job_id, "3f2504e0-4f89-11d3-9a0c-0305e82c3301");
        assert_eq!(record.server_address, "128.116.45.9");
        assert_eq!(record.server_type, ServerType::Public);
        assert!(!record.is_teleport);
    }

    #[test]
    fn private_server() {
        let (m, errors) = replay_fixture("private_server.log");
        assert!(errors.is_empty(), "{errors:?}");

        let record = m.record();
        assert!(record.in_game);
        assert_eq!(record.server_type, ServerType::Private);
        assert_eq!(record.place_id, "606849621");
        assert_eq!(record.server_address, "128.116.2.77");

        let activity = m.sink().activity().unwrap();
        assert_eq!(activity.state, "Private server");
        assert_eq!(activity.buttons.len(), 1);
    }

    #[test]
    fn reserved_teleport() {
        let (m, errors) = replay_fixture("reserved_teleport.log");
        assert!(errors.is_empty(), "{errors:?}");

        let record = m.record();
        assert!(record.in_game);
        assert!(record.is_teleport);
        assert_eq!(record.server_type, ServerType::Reserved);
        assert_eq!(record.job_id, "deadbeef-aaaa-bbbb-cccc-ddddeeeeffff");
        assert_eq!(record.server_address, "128.116.9.200");
        assert!(m.pending_teleport().is_none());

        let published = published(&m);
        assert_eq!(published.len(), 3);
        assert!(published[1].is_none());
        let first = published[0].as_ref().unwrap();
        let second = published[2].as_ref().unwrap();
        assert_eq!(second.state, "Reserved server (teleported)");
        assert_eq!(second.start, first.start);
        assert!(second.buttons.iter().all(|b| b.label != "Join server"));
    }

    #[test]
    fn reserved_teleport_before_join_line() {
        let content = load_fixture("reserved_teleport.log");
        let lines: Vec<&str> = content.lines().collect();
        let (m, _) = replay(lines[..6].iter().copied());

        assert_eq!(m.record(), SessionRecord::default());
        assert_eq!(m.pending_teleport(), Some(PendingTeleport::Reserved));
    }

    #[test]
    fn interleaved_and_malformed_lines() {
        let (m, errors) = replay_fixture("interleaved.log");

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SessionError::Message(_)));

        let record = m.record();
        assert!(record.in_game);
        assert_eq!(record.place_id, "920587237");
        assert_eq!(record.server_address, "128.116.3.3");

        let published = published(&m);
        assert_eq!(published.len(), 2);
        let activity = published[1].as_ref().unwrap();
        assert_eq!(activity.details, "Tower 2");
        assert!(activity.small_image.is_none());
    }

    #[test]
    fn records_never_partially_populated() {
        for name in [
            "public_session.log",
            "private_server.log",
            "reserved_teleport.log",
            "interleaved.log",
        ] {
            let content = load_fixture(name);
            let mut m = machine();
            for line in content.lines() {
                let _ = m.handle_line(line);
                let record = m.record();
                let filled = [&record.place_id, &record.job_id, &record.server_address]
                    .iter()
                    .filter(|v| !v.is_empty())
                    .count();
                assert!(filled == 0 || filled == 3, "{name}: {record:?}");
                assert!(!record.in_game || filled == 3, "{name}: {record:?}");
            }
        }
    }

    #[tokio::test]
    async fn tailed_log_matches_direct_replay() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let lines2 = Arc::clone(&lines);
        let tailer = LogTailer::new(
            Box::new(move |batch: Vec<String>| lines2.lock().unwrap().extend(batch)),
            TailOptions {
                from_start: true,
                poll_interval: Duration::from_millis(50),
            },
        );

        let tmp = tempfile::tempdir().unwrap();
        let log_file = tmp
            .path()
            .join("0.620.0.6200789_20240501T200000Z_Player_4B4B_last.log");
        fs::write(&log_file, load_fixture("reserved_teleport.log")).unwrap();

        tailer.start_watch(tmp.path().to_path_buf()).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        tailer.stop().await;

        let tailed = lines.lock().unwrap().clone();
        let (from_tail, _) = replay(tailed.iter().map(String::as_str));
        let (direct, _) = replay_fixture("reserved_teleport.log");
        assert_eq!(from_tail.record(), direct.record());
        assert!(from_tail.record().in_game);
    }

    /// What the tailer reported, in delivery order.
    #[derive(Debug, Clone, PartialEq)]
    enum Tailed {
        File(PathBuf),
        Line(String),
    }

    #[tokio::test]
    async fn crashed_run_is_ended_by_next_log() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let line_events = Arc::clone(&events);
        let file_events = Arc::clone(&events);
        let tailer = LogTailer::with_file_callback(
            Box::new(move |batch: Vec<String>| {
                line_events
                    .lock()
                    .unwrap()
                    .extend(batch.into_iter().map(Tailed::Line))
            }),
            Box::new(move |path: &Path| {
                file_events
                    .lock()
                    .unwrap()
                    .push(Tailed::File(path.to_path_buf()))
            }),
            TailOptions {
                from_start: true,
                poll_interval: Duration::from_millis(50),
            },
        );

        // The first run got in game and was killed before disconnecting.
        let public = load_fixture("public_session.log");
        let crashed: String = public.lines().take(6).map(|l| format!("{l}\n")).collect();
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp
            .path()
            .join("0.620.0.6200789_20240501T190000Z_Player_1A1A_last.log");
        fs::write(&first, crashed).unwrap();

        tailer.start_watch(tmp.path().to_path_buf()).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        let second = tmp
            .path()
            .join("0.620.0.6200789_20240501T200000Z_Player_2B2B_last.log");
        fs::write(&second, load_fixture("private_server.log")).unwrap();
        fs::File::options()
            .append(true)
            .open(&second)
            .unwrap()
            .set_modified(std::time::SystemTime::now() + Duration::from_secs(3_600))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        tailer.stop().await;

        let events = events.lock().unwrap().clone();
        assert_eq!(
            events.iter().filter(|e| matches!(e, Tailed::File(_))).count(),
            2,
            "{events:?}"
        );

        let mut m = machine();
        for event in &events {
            match event {
                Tailed::File(_) => m.reset().unwrap(),
                Tailed::Line(line) => {
                    let _ = m.handle_line(line);
                }
            }
        }

        let (direct, _) = replay_fixture("private_server.log");
        assert_eq!(m.record(), direct.record());
        assert_eq!(m.record().place_id, "606849621");
        assert_eq!(m.sink().activity().unwrap().state, "Private server");
    }
}
