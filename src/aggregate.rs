use crate::humanize::{bytes_to_human_readable, scaled_bytes_to_human_readable};
use crate::models::ContentCategory;
use crate::table::{RecordTable, TableRow};
use chrono::{DateTime, FixedOffset, Local, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Rows kept by the per-user domain/url rankings and the content-type histogram
pub const DETAIL_TOP_N: usize = 10;

/// Weekday order used by [`RecordTable::daily_usage`]
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Human description for the HTTP status codes a proxy commonly logs
pub fn describe_status(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_requests: usize,
    pub total_bytes: u64,
    pub unique_users: usize,
    pub unique_ips: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTraffic {
    pub user: String,
    pub traffic: u64,
    pub requests: usize,
    pub traffic_readable: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainVisits {
    pub domain: String,
    pub visits: usize,
    pub traffic: u64,
    pub traffic_readable: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyUsage {
    pub hour: u32,
    pub requests: usize,
    pub traffic: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub day_of_week: String,
    pub requests: usize,
    pub traffic: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status_code: u16,
    pub count: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeCount {
    pub content_type: ContentCategory,
    pub count: usize,
}

/// A value and how often it appeared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCount {
    pub value: String,
    pub visits: usize,
}

/// Per-user drill-down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetail {
    pub username: String,
    pub total_requests: usize,
    pub total_traffic: u64,
    pub traffic_readable: String,
    pub avg_response_size: f64,
    pub avg_response_readable: String,
    pub top_domains: Vec<RankedCount>,
    pub top_urls: Vec<RankedCount>,
    pub status_codes: Vec<StatusCount>,
    pub content_types: Vec<ContentTypeCount>,
    /// Percentage of 2xx responses
    pub success_rate: f64,
    /// Percentage of responses with status 400 or above
    pub error_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Requests and bytes accumulated for one group key
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    requests: usize,
    traffic: u64,
}

impl Tally {
    fn add(&mut self, size: u64) {
        self.requests += 1;
        self.traffic = self.traffic.saturating_add(size);
    }
}

/// Group rows by `key`, skipping rows for which it returns `None`.
/// Keys come back in ascending order so later stable sorts break ties by key.
fn tally_by<'a, K, F>(rows: impl Iterator<Item = &'a TableRow>, key: F) -> BTreeMap<K, Tally>
where
    K: Ord,
    F: Fn(&'a TableRow) -> Option<K>,
{
    let mut groups: BTreeMap<K, Tally> = BTreeMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().add(row.record.size);
        }
    }
    groups
}

fn status_histogram<'a>(rows: impl Iterator<Item = &'a TableRow>) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = tally_by(rows, |row| Some(row.record.status_code))
        .into_iter()
        .map(|(code, tally)| StatusCount {
            status_code: code,
            count: tally.requests,
            description: describe_status(code).to_string(),
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn content_histogram<'a>(rows: impl Iterator<Item = &'a TableRow>) -> Vec<ContentTypeCount> {
    let mut counts: Vec<ContentTypeCount> = tally_by(rows, |row| Some(row.record.content_type))
        .into_iter()
        .map(|(category, tally)| ContentTypeCount {
            content_type: category,
            count: tally.requests,
        })
        .collect();
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.content_type.as_str().cmp(b.content_type.as_str()))
    });
    counts
}

fn ranked_counts<'a, F>(rows: &[&'a TableRow], key: F, limit: usize) -> Vec<RankedCount>
where
    F: Fn(&'a TableRow) -> &'a str,
{
    let mut ranked: Vec<RankedCount> = tally_by(rows.iter().copied(), |row| Some(key(row)))
        .into_iter()
        .map(|(value, tally)| RankedCount {
            value: value.to_string(),
            visits: tally.requests,
        })
        .collect();
    ranked.sort_by(|a, b| b.visits.cmp(&a.visits));
    ranked.truncate(limit);
    ranked
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Read-only queries. None of them fail; empty tables give empty results.
impl RecordTable {
    pub fn summary(&self) -> Summary {
        let mut users: HashSet<&str> = HashSet::new();
        let mut ips: HashSet<&str> = HashSet::new();
        let mut total_bytes: u64 = 0;

        for record in self.records() {
            total_bytes = total_bytes.saturating_add(record.size);
            if let Some(user) = record.user.as_deref() {
                users.insert(user);
            }
            ips.insert(record.client_ip.as_str());
        }

        Summary {
            total_requests: self.len(),
            total_bytes,
            unique_users: users.len(),
            unique_ips: ips.len(),
        }
    }

    /// Users by traffic, heaviest first; absent and excluded users are skipped
    pub fn top_users(&self, limit: usize, excluded: &HashSet<String>) -> Vec<UserTraffic> {
        let groups = tally_by(self.rows().iter(), |row| {
            row.record
                .user
                .as_deref()
                .filter(|user| !excluded.contains(*user))
        });

        let mut users: Vec<UserTraffic> = groups
            .into_iter()
            .map(|(user, tally)| UserTraffic {
                user: user.to_string(),
                traffic: tally.traffic,
                requests: tally.requests,
                traffic_readable: bytes_to_human_readable(tally.traffic),
            })
            .collect();
        users.sort_by(|a, b| b.traffic.cmp(&a.traffic));
        users.truncate(limit);
        users
    }

    /// Domains by visit count, most visited first
    pub fn top_domains(&self, limit: usize, excluded: &HashSet<String>) -> Vec<DomainVisits> {
        let groups = tally_by(self.rows().iter(), |row| {
            Some(row.record.domain.as_str()).filter(|domain| !excluded.contains(*domain))
        });

        let mut domains: Vec<DomainVisits> = groups
            .into_iter()
            .map(|(domain, tally)| DomainVisits {
                domain: domain.to_string(),
                visits: tally.requests,
                traffic: tally.traffic,
                traffic_readable: bytes_to_human_readable(tally.traffic),
            })
            .collect();
        domains.sort_by(|a, b| b.visits.cmp(&a.visits));
        domains.truncate(limit);
        domains
    }

    /// Requests and traffic per hour of day, always 24 rows for a non-empty table
    pub fn hourly_usage(&self) -> Vec<HourlyUsage> {
        if self.is_empty() {
            return Vec::new();
        }

        let groups = tally_by(self.rows().iter(), |row| Some(row.hour));
        (0..24)
            .map(|hour| {
                let tally = groups.get(&hour).copied().unwrap_or_default();
                HourlyUsage {
                    hour,
                    requests: tally.requests,
                    traffic: tally.traffic,
                }
            })
            .collect()
    }

    /// Requests and traffic per weekday, Monday first; days without traffic are omitted
    pub fn daily_usage(&self) -> Vec<DailyUsage> {
        let mut groups: HashMap<Weekday, Tally> = HashMap::new();
        for row in self.rows() {
            groups.entry(row.weekday).or_default().add(row.record.size);
        }

        WEEK.iter()
            .filter_map(|day| {
                groups.get(day).map(|tally| DailyUsage {
                    day_of_week: weekday_name(*day).to_string(),
                    requests: tally.requests,
                    traffic: tally.traffic,
                })
            })
            .collect()
    }

    pub fn status_codes(&self) -> Vec<StatusCount> {
        status_histogram(self.rows().iter())
    }

    /// The ten most frequent content categories
    pub fn content_types(&self) -> Vec<ContentTypeCount> {
        let mut counts = content_histogram(self.rows().iter());
        counts.truncate(DETAIL_TOP_N);
        counts
    }

    pub fn user_detail(&self, username: &str) -> Option<UserDetail> {
        let rows: Vec<&TableRow> = self
            .rows()
            .iter()
            .filter(|row| row.record.user.as_deref() == Some(username))
            .collect();

        if rows.is_empty() {
            return None;
        }

        let total_requests = rows.len();
        let total_traffic = rows
            .iter()
            .fold(0u64, |acc, row| acc.saturating_add(row.record.size));
        let avg_response_size = total_traffic as f64 / total_requests as f64;

        let successes = rows
            .iter()
            .filter(|row| (200..=299).contains(&row.record.status_code))
            .count();
        let errors = rows.iter().filter(|row| row.record.status_code >= 400).count();

        Some(UserDetail {
            username: username.to_string(),
            total_requests,
            total_traffic,
            traffic_readable: bytes_to_human_readable(total_traffic),
            avg_response_size,
            avg_response_readable: scaled_bytes_to_human_readable(avg_response_size),
            top_domains: ranked_counts(&rows, |row| row.record.domain.as_str(), DETAIL_TOP_N),
            top_urls: ranked_counts(&rows, |row| row.record.url.as_str(), DETAIL_TOP_N),
            status_codes: status_histogram(rows.iter().copied()),
            content_types: content_histogram(rows.iter().copied()),
            success_rate: percentage(successes, total_requests),
            error_rate: percentage(errors, total_requests),
        })
    }

    /// Earliest and latest timestamp; both "now" for an empty table
    pub fn date_range(&self) -> DateRange {
        let mut timestamps = self.records().map(|record| record.timestamp);
        match timestamps.next() {
            Some(first) => {
                let (start, end) = timestamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
                DateRange { start, end }
            }
            None => {
                let now = Local::now().fixed_offset();
                DateRange { start: now, end: now }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogRecord, RawFields};
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn record(user: Option<&str>, url: &str, status: u16, size: u64, ts: &str) -> LogRecord {
        let size = size.to_string();
        LogRecord::from_raw(RawFields {
            timestamp: Some(ts),
            client_ip: "10.0.0.1",
            user: Some(user.unwrap_or("-")),
            method: Some("GET"),
            url: Some(url),
            status_code: status,
            size: Some(&size),
            ..Default::default()
        })
    }

    fn sample_table() -> RecordTable {
        RecordTable::from_records(
            vec![
                record(Some("alice"), "http://a.com/x.png", 200, 1000, "04/Mar/2024:09:00:00 +0000"),
                record(Some("alice"), "http://a.com/y.js", 200, 3000, "04/Mar/2024:09:30:00 +0000"),
                record(Some("bob"), "http://b.com/", 404, 500, "05/Mar/2024:14:00:00 +0000"),
                record(Some("bob"), "http://a.com/z.pdf", 502, 100, "10/Mar/2024:23:00:00 +0000"),
                record(None, "http://c.com/", 200, 7000, "10/Mar/2024:23:10:00 +0000"),
                record(Some("proxy"), "http://c.com/", 407, 0, "06/Mar/2024:01:00:00 +0000"),
            ],
            "common",
        )
    }

    fn none() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_summary() {
        let summary = sample_table().summary();
        assert_eq!(summary.total_requests, 6);
        assert_eq!(summary.total_bytes, 11600);
        assert_eq!(summary.unique_users, 3);
        assert_eq!(summary.unique_ips, 1);
    }

    #[test]
    fn test_empty_table_queries() {
        let table = RecordTable::from_records(Vec::new(), "detailed");
        assert_eq!(table.summary(), Summary::default());
        assert!(table.top_users(10, &none()).is_empty());
        assert!(table.top_domains(10, &none()).is_empty());
        assert!(table.hourly_usage().is_empty());
        assert!(table.daily_usage().is_empty());
        assert!(table.status_codes().is_empty());
        assert!(table.content_types().is_empty());
        assert!(table.user_detail("alice").is_none());
        let range = table.date_range();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_top_users_by_traffic_with_exclusions() {
        let table = sample_table();
        let excluded: HashSet<String> = ["proxy".to_string()].into_iter().collect();
        let users = table.top_users(10, &excluded);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user, "alice");
        assert_eq!(users[0].traffic, 4000);
        assert_eq!(users[0].requests, 2);
        assert_eq!(users[0].traffic_readable, "3.91 KB");
        assert_eq!(users[1].user, "bob");

        assert_eq!(table.top_users(1, &none()).len(), 1);
    }

    #[test]
    fn test_top_domains_by_visits() {
        let table = sample_table();
        let domains = table.top_domains(10, &none());
        assert_eq!(domains[0].domain, "a.com");
        assert_eq!(domains[0].visits, 3);
        assert_eq!(domains[0].traffic, 4100);
        // b.com and c.com: c.com has 2 visits
        assert_eq!(domains[1].domain, "c.com");

        let excluded: HashSet<String> = ["a.com".to_string()].into_iter().collect();
        let domains = table.top_domains(1, &excluded);
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].domain, "c.com");
    }

    #[test]
    fn test_hourly_usage_has_24_rows() {
        let hourly = sample_table().hourly_usage();
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[9].requests, 2);
        assert_eq!(hourly[9].traffic, 4000);
        assert_eq!(hourly[23].requests, 2);
        assert_eq!(hourly[12].requests, 0);
        assert!(hourly.iter().enumerate().all(|(i, row)| row.hour == i as u32));
    }

    #[test]
    fn test_daily_usage_is_ordered_monday_first() {
        // 4 Mar 2024 Monday, 5 Tuesday, 6 Wednesday, 10 Sunday
        let daily = sample_table().daily_usage();
        let days: Vec<&str> = daily.iter().map(|d| d.day_of_week.as_str()).collect();
        assert_eq!(days, vec!["Monday", "Tuesday", "Wednesday", "Sunday"]);
        assert_eq!(daily[0].requests, 2);
        assert_eq!(daily[3].traffic, 7100);
    }

    #[test]
    fn test_status_codes_with_descriptions() {
        let codes = sample_table().status_codes();
        assert_eq!(codes[0].status_code, 200);
        assert_eq!(codes[0].count, 3);
        assert_eq!(codes[0].description, "OK");
        let proxy_auth = codes.iter().find(|c| c.status_code == 407).unwrap();
        assert_eq!(proxy_auth.description, "Proxy Authentication Required");
        assert_eq!(describe_status(418), "Unknown");
    }

    #[test]
    fn test_content_types() {
        let types = sample_table().content_types();
        assert_eq!(types[0].content_type, ContentCategory::Other);
        assert_eq!(types[0].count, 3);
        assert!(types.len() <= DETAIL_TOP_N);
    }

    #[test]
    fn test_user_detail() {
        let table = sample_table();
        assert!(table.user_detail("ghost").is_none());

        let bob = table.user_detail("bob").unwrap();
        assert_eq!(bob.total_requests, 2);
        assert_eq!(bob.total_traffic, 600);
        assert_eq!(bob.traffic_readable, "600.00 B");
        assert!((bob.avg_response_size - 300.0).abs() < f64::EPSILON);
        assert_eq!(bob.avg_response_readable, "300.00 B");
        assert_eq!(bob.success_rate, 0.0);
        assert_eq!(bob.error_rate, 100.0);
        assert_eq!(bob.top_domains.len(), 2);
        assert_eq!(bob.status_codes.len(), 2);

        let alice = table.user_detail("alice").unwrap();
        assert_eq!(alice.success_rate, 100.0);
        assert_eq!(alice.top_domains[0], RankedCount { value: "a.com".to_string(), visits: 2 });
        assert_eq!(alice.content_types.len(), 2);
    }

    #[test]
    fn test_date_range() {
        let range = sample_table().date_range();
        assert_eq!(range.start.to_rfc3339(), "2024-03-04T09:00:00+00:00");
        assert_eq!(range.end.to_rfc3339(), "2024-03-10T23:10:00+00:00");
    }

    /// Small generated table: few users and domains so groups collide
    #[derive(Debug, Clone)]
    struct GeneratedTable(RecordTable);

    impl Arbitrary for GeneratedTable {
        fn arbitrary(g: &mut Gen) -> Self {
            let users = [Some("ann"), Some("ben"), Some("cy"), None];
            let urls = ["http://a.com/", "http://b.org/i.png", "c.net:443", "-"];
            let statuses = [200u16, 204, 302, 404, 503];
            let len = usize::arbitrary(g) % 40;
            let records = (0..len)
                .map(|_| {
                    let hour = u32::arbitrary(g) % 24;
                    let day = 1 + u32::arbitrary(g) % 28;
                    let ts = format!("{:02}/Feb/2024:{:02}:15:00 +0000", day, hour);
                    record(
                        *g.choose(&users).unwrap(),
                        g.choose(&urls).unwrap(),
                        *g.choose(&statuses).unwrap(),
                        u64::arbitrary(g) % 1_000_000,
                        &ts,
                    )
                })
                .collect();
            GeneratedTable(RecordTable::from_records(records, "common"))
        }
    }

    #[quickcheck]
    fn prop_traffic_partitions_between_users_and_anonymous(table: GeneratedTable) -> bool {
        let table = table.0;
        let by_user: u64 = table.top_users(usize::MAX, &HashSet::new()).iter().map(|u| u.traffic).sum();
        let anonymous: u64 = table
            .records()
            .filter(|r| r.user.is_none())
            .map(|r| r.size)
            .sum();
        by_user + anonymous == table.summary().total_bytes
    }

    #[quickcheck]
    fn prop_top_domains_bounded_and_sorted(table: GeneratedTable, limit: u8) -> bool {
        let limit = limit as usize;
        let domains = table.0.top_domains(limit, &HashSet::new());
        domains.len() <= limit && domains.windows(2).all(|w| w[0].visits >= w[1].visits)
    }

    #[quickcheck]
    fn prop_hourly_usage_covers_every_request(table: GeneratedTable) -> bool {
        let table = table.0;
        let hourly = table.hourly_usage();
        if table.is_empty() {
            return hourly.is_empty();
        }
        hourly.len() == 24
            && hourly.iter().map(|h| h.requests).sum::<usize>() == table.len()
            && hourly.iter().enumerate().all(|(i, h)| h.hour == i as u32)
    }
}
