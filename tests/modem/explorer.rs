use crate::mock::*;
use nbiot_explorer::modem::explorer::Job;
use nbiot_explorer::modem::{ConnectionOptions, Error, Explorer, Settings};
use nbiot_explorer::network::error::Error as LinkError;

fn ready_explorer(modem: ScriptedModem) -> (TestExplorer, u64) {
    let mut modem = modem;
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");
    let (explorer, now) = provisioned(modem, Settings::new(ConnectionOptions::one_nce()));
    assert_eq!(explorer.provisioning_result(), Some(&Ok(())));
    (explorer, now)
}

fn run_cycle(explorer: &mut TestExplorer) -> u64 {
    let mut now = explorer.next_poll_at().unwrap();
    explorer.poll(now).unwrap();
    assert_eq!(explorer.job(), Job::Polling);
    settle(explorer, &mut now);
    now
}

#[test]
fn test_end_to_end_cycle() {
    let mut modem = ScriptedModem::new();
    script_registered_cycle(&mut modem);
    let (mut explorer, _) = ready_explorer(modem);

    run_cycle(&mut explorer);

    let state = explorer.state();
    assert_eq!(state.status_primary.as_str(), "Registered");
    assert_eq!(state.status_secondary.as_str(), "Home-Network");
    assert_eq!(state.tracking_area_code.as_str(), "D5E0");
    assert_eq!(state.cell_id.as_str(), "1A2Bh");
    assert_eq!(state.enodeb_id, Some(26));
    assert_eq!(state.sector, Some(43));
    assert_eq!(state.access_technology, "LTE Cat NB1");
    assert_eq!(state.ip_address.as_str(), "10.0.0.5");
    assert_eq!(state.rssi.as_str(), "-73dBm (20)");
    assert_eq!(state.rssi_code, 20);
    assert_eq!(state.operator.as_str(), "26201");
    assert_eq!(state.band.as_str(), "LTE BAND 8");
    assert_eq!(state.channel.as_str(), "3740");
    assert_eq!(state.network_name.as_str(), "Telekom.de");
    assert_eq!(state.provider_name.as_str(), "1NCE");
    assert_eq!(state.rplmn.as_str(), "26201");
    assert_eq!(state.mcc.as_str(), "262");
    assert_eq!(state.mnc.as_str(), "01");
    assert_eq!(state.time_utc.as_str(), "");
    assert_eq!(state.date.as_str(), "");
    assert_eq!(state.latitude, 0.0);
    assert_eq!(state.longitude, 0.0);
    assert_eq!(state.elevation.as_str(), "0m");
    assert_eq!(state.satellites, 0);

    let display = explorer.renderer();
    assert_eq!(display.titles, vec!["Registered Network"]);
    assert_eq!(display.last_state.as_ref(), Some(explorer.state()));
}

#[test]
fn test_randomly_chunked_stream_gives_same_state() {
    for seed in 0..8 {
        let mut modem = ScriptedModem::with_chunking(seed);
        script_registered_cycle(&mut modem);
        let (mut explorer, _) = ready_explorer(modem);

        run_cycle(&mut explorer);

        assert_eq!(explorer.state().ip_address.as_str(), "10.0.0.5");
        assert_eq!(explorer.state().mnc.as_str(), "01");
        assert_eq!(explorer.renderer().titles.len(), 1);
    }
}

#[test]
fn test_gnss_fix_is_stored() {
    let mut modem = ScriptedModem::new();
    modem.on("AT+CEREG?", "ERROR").on(
        "AT+QGPSLOC=2",
        "+QGPSLOC: 132413.0,48.11730,11.51667,1.2,545.4,3,0.00,0.0,0.0,160919,07\nOK",
    );
    let (mut explorer, _) = ready_explorer(modem);

    run_cycle(&mut explorer);

    let state = explorer.state();
    assert_eq!(state.time_utc.as_str(), "13:24:13");
    assert_eq!(state.date.as_str(), "2019-09-16");
    assert_eq!(state.elevation.as_str(), "545.4m");
    assert_eq!(state.satellites, 7);
    assert!((state.latitude - 48.1173).abs() < 1e-9);
    // The failed registration query skipped straight to GNSS.
    assert!(!explorer.port().sent("AT+CGPADDR=1"));
    assert_eq!(explorer.renderer().titles.len(), 1);
}

#[test]
fn test_searching_modem_is_registered_manually() {
    let mut modem = ScriptedModem::new();
    modem
        .on("AT+CEREG?", "+CEREG: 2,2\nOK")
        .on("AT+COPS=1,2,\"26201\",9", "OK")
        .on("AT+CGPADDR=1", "+CGPADDR: 1,10.0.0.5\nOK")
        .on("AT+CSQ", "+CSQ: 99,99\nOK")
        .on("AT+QNWINFO", "ERROR")
        .on("AT+QGPSLOC=2", "OK");
    let (mut explorer, _) = ready_explorer(modem);
    let provisioning_commands = explorer.port().written.len();

    run_cycle(&mut explorer);

    let cycle: Vec<&str> = explorer.port().written[provisioning_commands..]
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(
        cycle,
        vec![
            "AT+CEREG?",
            "AT+COPS=1,2,\"26201\",9",
            "AT+CGPADDR=1",
            "AT+CSQ",
            "AT+QNWINFO",
            "AT+QGPSLOC=2",
        ]
    );
    let state = explorer.state();
    assert_eq!(state.status_primary.as_str(), "Searching");
    assert_eq!(state.status_secondary.as_str(), "");
    assert!(state.cell_id.is_empty());
    assert_eq!(state.enodeb_id, None);
    assert_eq!(state.rssi.as_str(), "Unknown (99)");
    assert_eq!(state.elevation.as_str(), "0m");
}

#[test]
fn test_gnss_error_keeps_previous_fix() {
    let mut modem = ScriptedModem::new();
    modem
        .on("AT+CEREG?", "ERROR")
        .on(
            "AT+QGPSLOC=2",
            "+QGPSLOC: 132413.0,48.11730,11.51667,1.2,545.4,3,0.00,0.0,0.0,160919,07\nOK",
        )
        .on("AT+CEREG?", "ERROR")
        .on("AT+QGPSLOC=2", "+CME ERROR: 505");
    let (mut explorer, _) = ready_explorer(modem);

    run_cycle(&mut explorer);
    run_cycle(&mut explorer);

    assert_eq!(explorer.state().satellites, 7);
    assert_eq!(explorer.renderer().titles.len(), 2);
}

#[test]
fn test_cycles_repeat_on_interval() {
    let mut modem = ScriptedModem::new();
    script_registered_cycle(&mut modem);
    script_registered_cycle(&mut modem);
    let (mut explorer, _) = ready_explorer(modem);

    let first = explorer.next_poll_at().unwrap();
    run_cycle(&mut explorer);
    assert_eq!(explorer.next_poll_at(), Some(first + 10_000));
    run_cycle(&mut explorer);
    assert_eq!(explorer.renderer().titles.len(), 2);
}

#[test]
fn test_tick_is_skipped_while_cycle_runs() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");
    // Registration query never answers, so the cycle outlives one interval.
    modem.on("AT+QGPSLOC=2", "OK");
    let settings = Settings::from_json(
        r#"{"connection":{"band":"B8","apn":"iot.1nce.net","operator":"26201"},"update_interval_ms":300}"#,
    )
    .unwrap();
    let (mut explorer, _) = provisioned(modem, settings);

    let mut now = explorer.next_poll_at().unwrap();
    explorer.poll(now).unwrap();
    assert_eq!(explorer.job(), Job::Polling);
    assert_eq!(explorer.poll_once(now), Err(Error::Busy));

    now += 300;
    explorer.poll(now).unwrap();
    assert_eq!(explorer.job(), Job::Polling);
    assert_eq!(
        explorer.port().written.iter().filter(|c| *c == "AT+CEREG?").count(),
        1
    );

    settle(&mut explorer, &mut now);
    assert_eq!(explorer.renderer().titles.len(), 1);
}

#[test]
fn test_ready_cancels_timer_and_reprovisions() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");
    let (mut explorer, now) = ready_explorer(modem);
    assert!(explorer.next_poll_at().is_some());

    explorer.port_mut().emit("\r\nRDY\r\n");
    explorer.poll(now + 1).unwrap();

    assert_eq!(explorer.next_poll_at(), None);
    assert_eq!(explorer.job(), Job::Provisioning);
    assert_eq!(explorer.provisioning_result(), None);

    let mut now = now + 1;
    settle(&mut explorer, &mut now);
    assert_eq!(explorer.provisioning_result(), Some(&Ok(())));
    assert_eq!(
        explorer.port().written.iter().filter(|c| *c == "AT&F0").count(),
        2
    );
}

#[test]
fn test_ready_abandons_running_cycle() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");
    let (mut explorer, _) = ready_explorer(modem);

    let now = explorer.next_poll_at().unwrap();
    explorer.poll(now).unwrap();
    assert_eq!(explorer.job(), Job::Polling);

    explorer.port_mut().emit("RDY\r\n");
    explorer.poll(now + 1).unwrap();
    assert_eq!(explorer.job(), Job::Provisioning);

    // The abandoned query must not time out into the new sequence.
    explorer.poll(now + 1_000).unwrap();
    assert_eq!(explorer.job(), Job::Provisioning);
    assert!(explorer.renderer().titles.is_empty());
}

#[test]
fn test_boot_chatter_is_dropped() {
    let mut modem = ScriptedModem::new();
    modem.emit("\r\nQuectel BG96\r\nRevision: BG96MAR02A07M1G\r\nOK\r\n");
    let mut explorer = Explorer::new(
        modem,
        RecordingDisplay::default(),
        Settings::new(ConnectionOptions::one_nce()),
    );

    explorer.poll(0).unwrap();

    assert_eq!(explorer.job(), Job::Idle);
    assert!(explorer.port().written.is_empty());
}

#[test]
fn test_stream_end_fails_pending_command() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");
    let (mut explorer, _) = ready_explorer(modem);

    let now = explorer.next_poll_at().unwrap();
    explorer.poll(now).unwrap();
    explorer.port_mut().close();

    assert_eq!(
        explorer.poll(now + 1),
        Err(Error::Transport(LinkError::ConnectionClosed))
    );
    // Every remaining command fails to write, so the cycle runs to its end.
    assert_eq!(explorer.job(), Job::Idle);
    assert_eq!(explorer.renderer().titles.len(), 1);
}

#[test]
fn test_notification_inside_answer_is_ignored() {
    let mut modem = ScriptedModem::new();
    modem
        .on(
            "AT+CEREG?",
            "+CEREG: 5,\"D5E0\",\"1A2B\",9\n+CEREG: 2,1,\"D5E0\",\"1A2B\",9\nOK",
        )
        .on("AT+CGPADDR=1", "+CGPADDR: 1,10.0.0.5\nOK")
        .on("AT+CSQ", "+CSQ: 300,99\nOK")
        .on(
            "AT+QNWINFO",
            "+QNWINFO: \"CAT-NB1\",\"26201\",\"LTE BAND 8\",3740\nOK",
        )
        .on("AT+QSPN", "+QSPN: \"Telekom.de\",\"TDG\",\"1NCE\",0,\"26201\"\nOK")
        .on("AT+QGPSLOC=2", "+CME ERROR: 516");
    let (mut explorer, _) = ready_explorer(modem);

    run_cycle(&mut explorer);

    let state = explorer.state();
    assert_eq!(state.status_primary.as_str(), "Registered");
    assert_eq!(state.cell_id.as_str(), "1A2Bh");
    assert_eq!(state.ip_address.as_str(), "10.0.0.5");
    assert_eq!(state.rssi.as_str(), "Invalid (300)");
    assert_eq!(state.rssi_code, 300);
    assert_eq!(state.band.as_str(), "LTE BAND 8");
    assert_eq!(state.provider_name.as_str(), "1NCE");
}

#[test]
fn test_read_errors_do_not_stop_timers() {
    let mut modem = ScriptedModem::new();
    modem.emit("RDY\r\n");
    modem.fail_reads();
    let mut explorer = Explorer::new(
        modem,
        RecordingDisplay::default(),
        Settings::new(ConnectionOptions::one_nce()),
    );

    let mut now = 0;
    while explorer.provisioning_result().is_none() && now < 60_000 {
        assert_eq!(
            explorer.poll(now),
            Err(Error::Transport(LinkError::ReadError))
        );
        now += 100;
    }

    match explorer.provisioning_result() {
        Some(Err(Error::Command(e))) => {
            assert!(e.is_timeout());
            assert_eq!(e.command.as_str(), "AT&F0");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(explorer.port().written, vec!["AT&F0"]);
    assert!(explorer.next_poll_at().is_some());
}

#[test]
fn test_screen_navigation_wraps_and_renders() {
    let (mut explorer, _) = ready_explorer(ScriptedModem::new());

    explorer.next_screen();
    explorer.previous_screen();
    explorer.previous_screen();

    assert_eq!(
        explorer.renderer().titles,
        vec!["Registration Status", "Registered Network", "Date and Time"]
    );
    assert_eq!(explorer.current_screen().title, "Date and Time");
}

#[test]
fn test_manual_poll_when_idle() {
    let mut modem = ScriptedModem::new();
    script_registered_cycle(&mut modem);
    let (mut explorer, mut now) = ready_explorer(modem);

    explorer.poll_once(now).unwrap();
    settle(&mut explorer, &mut now);

    assert_eq!(explorer.state().ip_address.as_str(), "10.0.0.5");
    assert_eq!(explorer.renderer().titles.len(), 1);
}
