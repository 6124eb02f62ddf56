use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use waypresence::PeerId;

#[derive(Parser, Debug, Clone)]
pub struct Opts {
    /// Directory holding persisted presence state
    #[clap(long = "data-dir", env = "WAYPRESENCE_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Where presence notifications are posted; only logged if not set
    #[clap(long = "endpoint", env = "WAYPRESENCE_ENDPOINT")]
    pub endpoint: Option<reqwest::Url>,

    /// Channel id of the locally tracked user
    #[clap(long = "peer-id", env = "WAYPRESENCE_PEER_ID")]
    pub peer_id: Option<String>,

    /// JSON file with waypoints to use instead of the builtin ones
    #[clap(long = "waypoints", env = "WAYPRESENCE_WAYPOINTS")]
    pub waypoints: Option<PathBuf>,

    /// How long to wait for in-flight notifications on exit
    #[clap(long = "flush-grace", default_value = "2s", value_parser = parse_duration)]
    pub flush_grace: Duration,
}

impl Opts {
    pub fn from_args() -> Self {
        Opts::parse()
    }

    pub fn peer_id(&self) -> Option<PeerId> {
        self.peer_id.as_deref().map(PeerId::from)
    }
}

fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim().to_lowercase();
    let parse = |num: &str| u64::from_str(num).map_err(|e| format!("{e}: {s}"));

    Ok(if let Some(num) = s.strip_suffix("ms") {
        Duration::from_millis(parse(num)?)
    } else if let Some(num) = s.strip_suffix('s') {
        Duration::from_secs(parse(num)?)
    } else if let Some(num) = s.strip_suffix('m') {
        Duration::from_secs(
            parse(num)?
                .checked_mul(60)
                .ok_or_else(|| format!("duration too large: {s}"))?,
        )
    } else {
        Duration::from_millis(parse(&s)?)
    })
}

#[test]
fn parse_duration_test() {
    assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    assert_eq!(parse_duration("250"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
    assert_eq!(parse_duration(" 3S "), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("1h").is_err());
    assert!(parse_duration("ms").is_err());
    assert_eq!(
        parse_duration(&format!("{}m", u64::MAX / 60)),
        Ok(Duration::from_secs(u64::MAX / 60 * 60))
    );
    assert!(parse_duration(&format!("{}m", u64::MAX / 60 + 1)).is_err());
    assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
}
