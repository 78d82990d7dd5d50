use crate::mock::*;
use nbiot_explorer::modem::{ConnectionOptions, Error, Settings};

#[test]
fn test_provisioning_sends_every_step_in_order() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");

    let (explorer, now) = provisioned(modem, Settings::new(ConnectionOptions::one_nce()));

    assert_eq!(explorer.provisioning_result(), Some(&Ok(())));
    assert_eq!(
        explorer.port().written,
        vec![
            "AT&F0",
            "ATE0",
            "AT+CPIN?",
            "AT+QCFG=\"band\",0,0,80,1",
            "AT+QCFG=\"nwscanmode\",3,1",
            "AT+QCFG=\"nwscanseq\",030102,1",
            "AT+QCFG=\"iotopmode\",1,1",
            "AT+QCFG=\"servicedomain\",1,1",
            "AT+CGDCONT=1,\"IP\",\"iot.1nce.net\"",
            "AT+CFUN=1",
            "AT+QGPS?",
            "AT+CEREG=2",
            "AT+COPS=1,2,\"26201\",9",
        ]
    );
    assert_eq!(explorer.next_poll_at(), Some(now + 10_000));
}

#[test]
fn test_first_command_waits_for_startup_delay() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");
    let mut explorer = nbiot_explorer::modem::Explorer::new(
        modem,
        RecordingDisplay::default(),
        Settings::new(ConnectionOptions::one_nce()),
    );

    explorer.port_mut().emit("RDY\r\n");
    explorer.poll(0).unwrap();
    explorer.poll(999).unwrap();
    assert!(explorer.port().written.is_empty());
    explorer.poll(1_000).unwrap();
    assert_eq!(explorer.port().written.first().map(String::as_str), Some("AT&F0"));
}

#[test]
fn test_gnss_is_switched_on_when_off() {
    let mut modem = ScriptedModem::new();
    modem
        .on("AT&F0", "OK")
        .on("ATE0", "OK")
        .on("AT+CPIN?", "+CPIN: READY\nOK")
        .on("AT+QCFG=\"band\",0,0,80000,1", "OK")
        .on("AT+QCFG=\"nwscanmode\",3,1", "OK")
        .on("AT+QCFG=\"nwscanseq\",030102,1", "OK")
        .on("AT+QCFG=\"iotopmode\",1,1", "OK")
        .on("AT+QCFG=\"servicedomain\",1,1", "OK")
        .on("AT+CGDCONT=1,\"IP\",\"vgesace.nb.iot\"", "OK")
        .on("AT+CFUN=1", "OK")
        .on("AT+QGPS?", "+QGPS: 0\nOK")
        .on("AT+QGPS=1", "OK")
        .on("AT+CEREG=2", "OK")
        .on("AT+COPS=1,2,\"26202\",9", "OK");

    let (explorer, _) = provisioned(modem, Settings::new(ConnectionOptions::vodafone_de()));

    assert_eq!(explorer.provisioning_result(), Some(&Ok(())));
    let written = &explorer.port().written;
    let query = written.iter().position(|c| c == "AT+QGPS?").unwrap();
    assert_eq!(written[query + 1], "AT+QGPS=1");
    assert_eq!(written[query + 2], "AT+CEREG=2");
}

#[test]
fn test_unknown_band_writes_no_radio_configuration() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "26201");
    let options = ConnectionOptions::new("B99", "iot.1nce.net", "26201").unwrap();

    let (explorer, now) = provisioned(modem, Settings::new(options));

    match explorer.provisioning_result() {
        Some(Err(Error::UnknownBand(band))) => assert_eq!(band.as_str(), "B99"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!explorer.port().written.iter().any(|c| c.starts_with("AT+QCFG")));
    assert_eq!(explorer.port().written.last().map(String::as_str), Some("AT+CPIN?"));
    // Polling still gets scheduled.
    assert_eq!(explorer.next_poll_at(), Some(now + 10_000));
}

#[test]
fn test_sim_failure_aborts() {
    let mut modem = ScriptedModem::new();
    modem
        .on("AT&F0", "OK")
        .on("ATE0", "OK")
        .on("AT+CPIN?", "+CME ERROR: 10");

    let (explorer, _) = provisioned(modem, Settings::new(ConnectionOptions::one_nce()));

    match explorer.provisioning_result() {
        Some(Err(Error::Command(e))) => {
            assert_eq!(e.command.as_str(), "AT+CPIN?");
            assert_eq!(e.cme_code(), Some(10));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(explorer.port().written.len(), 3);
}

#[test]
fn test_silent_command_times_out_and_aborts() {
    let mut modem = ScriptedModem::new();
    modem.on("AT&F0", "OK");

    let (explorer, now) = provisioned(modem, Settings::new(ConnectionOptions::one_nce()));

    match explorer.provisioning_result() {
        Some(Err(Error::Command(e))) => {
            assert!(e.is_timeout());
            assert_eq!(e.command.as_str(), "ATE0");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(now >= 2_000);
}

#[test]
fn test_registration_timeout_is_tolerated() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "iot.1nce.net", "99999");

    let (explorer, now) = provisioned(modem, Settings::new(ConnectionOptions::one_nce()));

    assert_eq!(explorer.provisioning_result(), Some(&Ok(())));
    assert!(explorer.port().sent("AT+COPS=1,2,\"26201\",9"));
    assert!(now >= 6_000);
}

#[test]
fn test_apn_is_escaped() {
    let mut modem = ScriptedModem::new();
    script_provisioning(&mut modem, "80", "my\\\"apn", "26201");
    let options = ConnectionOptions::new("B8", "my\"apn", "26201").unwrap();

    let (explorer, _) = provisioned(modem, Settings::new(options));

    assert!(explorer.port().sent("AT+CGDCONT=1,\"IP\",\"my\\\"apn\""));
    assert_eq!(explorer.provisioning_result(), Some(&Ok(())));
}
