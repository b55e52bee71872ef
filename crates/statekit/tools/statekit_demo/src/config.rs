use std::env;
use std::time::Duration;

use statekit::State;

pub const DEFAULT_COMPONENTS: usize = 3;
pub const ENV_FAIL_ONE: &str = "STATEKIT_DEMO_FAIL_ONE";

pub struct Config {
    pub components: usize,
    pub timeout: Duration,
    pub target: State,
    pub fail_one: bool,
    pub core: statekit::Config,
}

impl Config {
    pub fn from_args() -> Self {
        Self::from_args_iter(env::args())
    }

    pub fn from_args_iter<I, S>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let core = statekit::Config::from_env();
        let mut components = DEFAULT_COMPONENTS;
        let mut timeout = core.wait_timeout;
        let mut target = core.target_state;
        let mut fail_one = env::var(ENV_FAIL_ONE)
            .ok()
            .and_then(parse_bool)
            .unwrap_or(false);

        let mut args = iter.into_iter();
        let _ = args.next();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            match arg {
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                "--components" => {
                    if let Some(value) = args.next() {
                        components = parse_count(value.as_ref()).unwrap_or(components);
                    }
                }
                "--timeout-ms" => {
                    if let Some(value) = args.next() {
                        timeout = parse_ms(value.as_ref()).unwrap_or(timeout);
                    }
                }
                "--target" => {
                    if let Some(value) = args.next() {
                        target = value.as_ref().parse().unwrap_or(target);
                    }
                }
                "--fail-one" => {
                    fail_one = true;
                }
                _ if arg.starts_with("--components=") => {
                    components = parse_count(&arg["--components=".len()..]).unwrap_or(components);
                }
                _ if arg.starts_with("--timeout-ms=") => {
                    timeout = parse_ms(&arg["--timeout-ms=".len()..]).unwrap_or(timeout);
                }
                _ if arg.starts_with("--target=") => {
                    target = arg["--target=".len()..].parse().unwrap_or(target);
                }
                _ => {}
            }
        }

        Self {
            components,
            timeout,
            target,
            fail_one,
            core,
        }
    }
}

fn print_usage() {
    println!(
        "statekit_demo [--components N] [--timeout-ms N] [--target STATE] [--fail-one]"
    );
}

fn parse_count(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|n| *n > 0)
}

fn parse_ms(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

fn parse_bool(value: String) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
