//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Classroom Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[server]
backend_url = "http://localhost:5000"
# room_path = "vr"
# connect_timeout_secs = 15    # 1-120
# reconnect_delay_ms = 500     # doubles on each failed attempt
# max_reconnect_delay_ms = 30000

[identity]
# username = ""                # max 32 characters

[movement]
# tick_interval_ms = 33        # 5-1000
# speed = 5.0                  # room units per second
# lerp_factor = 0.1            # 0.01-1.0, remote smoothing per render tick
# spawn = [0.0, 0.75, 4.0]
# waiting_area = [-5.0, 0.75, 8.0]

[movement.bounds]
# min_x = -10.0
# max_x = 10.0
# min_z = -8.0
# max_z = 12.0

[voice]
# block_size = 4096            # power of two, 256-16384
# sample_rate = 44100
# activity_timeout_ms = 2000   # speaking indicator fallback
# echo_cancellation = true
# noise_suppression = true
# start_muted = false

[chat]
# max_messages = 500

[logging]
# level = "info"               # trace, debug, info, warn, error
"##
    .to_string()
}
