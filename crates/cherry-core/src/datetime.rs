use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Days,
  Duration,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "cherry-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "CHERRY_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "CHERRY_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Timezone all day boundaries and
/// day keys are computed in. Resolved
/// once: env var, then config file,
/// then UTC.
pub fn project_timezone() -> &'static Tz
{
  static PROJECT_TZ: OnceLock<Tz> =
    OnceLock::new();
  PROJECT_TZ.get_or_init(
    resolve_project_timezone
  )
}

#[must_use]
pub fn to_project_date(
  dt: DateTime<Utc>
) -> NaiveDate {
  dt.with_timezone(project_timezone())
    .date_naive()
}

/// Calendar-date bucket key
/// (`YYYY-MM-DD`). Shared by the
/// activity-log keys and the trend
/// buckets.
#[must_use]
pub fn day_key(
  dt: DateTime<Utc>
) -> String {
  dt.with_timezone(project_timezone())
    .format("%Y-%m-%d")
    .to_string()
}

#[must_use]
pub fn format_day_key(
  date: NaiveDate
) -> String {
  date.format("%Y-%m-%d").to_string()
}

/// Midnight of `now`'s calendar day in
/// the project timezone, as UTC.
#[must_use]
pub fn start_of_day(
  now: DateTime<Utc>
) -> DateTime<Utc> {
  local_midnight_utc(to_project_date(
    now
  ))
}

/// `[start_of_day(now),
/// start_of_day(now) + 1 day)` —
/// half-open.
#[must_use]
pub fn today_window(
  now: DateTime<Utc>
) -> (DateTime<Utc>, DateTime<Utc>) {
  let date = to_project_date(now);
  let next = date
    .checked_add_days(Days::new(1))
    .unwrap_or(date);
  (
    local_midnight_utc(date),
    local_midnight_utc(next)
  )
}

/// `(now, start_of_day(now) + 7 days]`
/// — exclusive of `now`, inclusive of
/// the end instant.
#[must_use]
pub fn next_seven_days_window(
  now: DateTime<Utc>
) -> (DateTime<Utc>, DateTime<Utc>) {
  let date = to_project_date(now);
  let end = date
    .checked_add_days(Days::new(7))
    .unwrap_or(date);
  (now, local_midnight_utc(end))
}

/// The 7 calendar days ending at
/// `now`'s day, oldest first. One trend
/// bucket per day.
#[must_use]
pub fn trend_days(
  now: DateTime<Utc>
) -> Vec<NaiveDate> {
  let today = to_project_date(now);
  (0..7)
    .rev()
    .map(|back| {
      today
        .checked_sub_days(Days::new(
          back
        ))
        .unwrap_or(today)
    })
    .collect()
}

fn local_midnight_utc(
  date: NaiveDate
) -> DateTime<Utc> {
  let tz = project_timezone();

  // DST transitions can skip local
  // midnight; take the first hour that
  // exists.
  for hour in 0..3 {
    if let Some(naive) =
      date.and_hms_opt(hour, 0, 0)
      && let Some(local) = tz
        .from_local_datetime(&naive)
        .earliest()
    {
      return local.with_timezone(&Utc);
    }
  }

  Utc.from_utc_datetime(
    &NaiveDateTime::new(
      date,
      NaiveTime::MIN
    )
  )
}

fn resolve_project_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  tracing::debug!(
    "no timezone configured; using UTC"
  );
  chrono_tz::UTC
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    })?;

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Resolves a CLI day expression
/// (`--date`) to a calendar date.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_day_key(
  input: &str,
  now: DateTime<Utc>
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  match token
    .to_ascii_lowercase()
    .as_str()
  {
    | "today" => {
      return Ok(to_project_date(now));
    }
    | "yesterday" => {
      let today = to_project_date(now);
      return Ok(
        today
          .checked_sub_days(Days::new(
            1
          ))
          .unwrap_or(today)
      );
    }
    | "tomorrow" => {
      let today = to_project_date(now);
      return Ok(
        today
          .checked_add_days(Days::new(
            1
          ))
          .unwrap_or(today)
      );
    }
    | _ => {}
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "unrecognized date: {input} \
       (expected today, yesterday, \
       tomorrow, or YYYY-MM-DD)"
    )
  })
}

/// Resolves a CLI instant expression
/// (`--now`) so every derivation runs
/// against an explicit reference time.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  now: DateTime<Utc>
) -> anyhow::Result<DateTime<Utc>> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "now" => return Ok(now),
    | "today" => {
      return Ok(start_of_day(now));
    }
    | "tomorrow" => {
      return Ok(
        start_of_day(now)
          + Duration::days(1)
      );
    }
    | "yesterday" => {
      return Ok(
        start_of_day(now)
          - Duration::days(1)
      );
    }
    | _ => {}
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dhm])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(token)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let duration = match unit {
      | "d" => Duration::days(num),
      | "h" => Duration::hours(num),
      | "m" => Duration::minutes(num),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ));
      }
    };

    return Ok(
      if sign == "-" {
        now - duration
      } else {
        now + duration
      }
    );
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(local_midnight_utc(
      date
    ));
  }

  for fmt in
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
  {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
      && let Some(local) =
        project_timezone()
          .from_local_datetime(&ndt)
          .earliest()
    {
      return Ok(
        local.with_timezone(&Utc)
      );
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     now/today/tomorrow/yesterday, \
     +Nd/+Nh/+Nm, RFC3339, \
     YYYY-MM-DD, YYYY-MM-DDTHH:MM, \
     YYYY-MM-DD HH:MM"
  })
}
