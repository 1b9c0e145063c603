use std::{env, fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[space]\n"
        + "n_bins = 48\n"
        + "tx_slots = 12\n"
        + "jam_slots = 12\n"
        + "modulations = [ \"bpsk\", \"qpsk\", \"qam16\",]\n"
        + "\n"
        + "[env]\n"
        + "snr_db = 12.0\n"
        + "bandwidth_mhz = 20.0\n"
        + "noise_density = 1e-9\n"
        + "jam_max_power = 30.0\n"
        + "jam_max_span = 9\n"
        + "tx_max_power = 1.0\n"
        + "learning_rate = 0.2\n"
        + "exploration_rate = 0.1\n"
        + "learning_frozen = false\n"
        + "jammer_adaptive = true\n"
        + "\n"
        + "[run]\n"
        + "n_ticks = 1000\n"
        + "history_capacity = 120\n"
        + "ticks_per_file = 256\n"
        + "seed = 12345\n"
        + "mutate_ticks = [ 500,]\n"
        + "\n"
        + "[[schedule]]\n"
        + "start_tick = 700\n"
        + "jammer_adaptive = false\n"
        + "\n"
        + "[[schedule]]\n"
        + "start_tick = 900\n"
        + "learning_frozen = true\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_spectrum-duel"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "run"]);
    run_bin(&["--sim-dir", test_dir_str, "run"]);

    let run_dir = test_dir.join("run-0001");
    for file_idx in 0..4 {
        let file = run_dir.join(format!("trajectory-{file_idx:04}.msgpack"));
        assert!(file.is_file(), "missing {file:?}");
    }

    run_bin(&["--sim-dir", test_dir_str, "analyze"]);

    let results =
        fs::read_to_string(run_dir.join("results.json")).expect("failed to read results file");
    assert!(results.contains("throughput_mbps"));
    assert!(results.contains("tx_slot_occupancy"));

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!run_dir.exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_fails() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_config");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_contents = "[env]\nsnr_db = 12.0\n";
    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    let output = Command::new(env!("CARGO_BIN_EXE_spectrum-duel"))
        .args(["--sim-dir", test_dir.to_str().expect("invalid path"), "run"])
        .output()
        .expect("failed to execute command");

    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}
