//! In-memory fixture store and query facade.
//!
//! Everything the dashboard serves lives here: the fixed attack-type taxonomy,
//! seeded synthetic intrusion records, security tips, chat transcripts, the
//! stats singleton and scan results. Nothing survives a restart.
//!
//! Collections that are mutated after startup sit behind `DashMap` (or an
//! `RwLock` for the two singletons) so the store is safe on a multi-threaded
//! runtime without a global lock.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

// ──────────────────────────────────────────────────────────────────────────────
// Entities
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackType {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color: String,
    pub class_name: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intrusion {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub attack_type_id: i64,
    pub confidence: i32,
    pub status: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityTip {
    pub id: i64,
    pub attack_type_id: i64,
    pub tip: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_requests: i64,
    pub attacks_detected: i64,
    pub model_accuracy: i32,
    pub request_increase: i32,
    pub attack_increase: i32,
    pub accuracy_improvement: i32,
    pub updated_at: DateTime<Utc>,
}

/// Wholesale replacement values for the stats singleton.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdate {
    pub total_requests: i64,
    pub attacks_detected: i64,
    pub model_accuracy: i32,
    pub request_increase: i32,
    pub attack_increase: i32,
    pub accuracy_improvement: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub name: String,
    pub total_records: i64,
    pub attack_classes: i32,
    pub features: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPerformance {
    pub name: String,
    pub accuracy: i32,
    pub precision: i32,
    pub recall: i32,
    pub f1_score: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanVulnerability {
    pub name: String,
    pub severity: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFinding {
    pub device_ip: String,
    pub device_type: String,
    pub open_ports: Vec<ScanPort>,
    pub vulnerabilities: Vec<ScanVulnerability>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPort {
    pub port: u16,
    pub service: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub devices_scanned: usize,
    pub vulnerabilities_found: usize,
    pub critical_issues: usize,
    pub scan_duration: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub findings: Vec<ScanFinding>,
    pub summary: ScanSummary,
}

// ──────────────────────────────────────────────────────────────────────────────
// Read-model types (display-ready fields derived at read time)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrusionWithType {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub confidence: i32,
    pub status: String,
    pub details: Option<String>,
    pub attack_type: String,
    pub attack_type_class: String,
    pub status_class: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrusionPage {
    pub intrusions: Vec<IntrusionWithType>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackDistributionItem {
    pub name: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackDistribution {
    pub time_range: String,
    pub distribution: Vec<AttackDistributionItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAttackTypeItem {
    pub id: String,
    pub name: String,
    pub count: usize,
    /// Mock trend value, regenerated on every call. Not derived from any
    /// historical comparison.
    pub change: i32,
    pub icon: String,
    pub color: String,
    pub border_color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TipItem {
    pub id: String,
    pub tip: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityInfoItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tips: Vec<TipItem>,
    pub color: String,
    pub gradient: String,
    pub icon: String,
    pub icon_class: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfoResponse {
    pub dataset_info: DatasetInfo,
    pub models: Vec<ModelPerformance>,
}

// ──────────────────────────────────────────────────────────────────────────────
// Time ranges
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Day,
    Week,
    Month,
}

impl TimeRange {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(TimeRange::Day),
            "week" => Some(TimeRange::Week),
            "month" => Some(TimeRange::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
        }
    }

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Day => now - Duration::days(1),
            TimeRange::Week => now - Duration::days(7),
            TimeRange::Month => now - Duration::days(30),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// The store
// ──────────────────────────────────────────────────────────────────────────────

const SEEDED_INTRUSIONS: usize = 50;
const IP_PREFIXES: [&str; 4] = ["192.168.1.", "10.0.0.", "172.16.0.", "169.254.0."];
const SEED_STATUSES: [&str; 4] = ["Blocked", "Monitoring", "Resolved", "Investigating"];

/// Per-attack-type confidence bands used when seeding, indexed by type id - 1.
const CONFIDENCE_BANDS: [(i32, i32); 5] = [(90, 99), (75, 89), (60, 74), (45, 59), (30, 44)];

pub struct MemStore {
    attack_types: Vec<AttackType>,
    security_tips: Vec<SecurityTip>,
    intrusions: DashMap<i64, Intrusion>,
    chat_sessions: DashMap<String, Vec<ChatMessage>>,
    scans: DashMap<String, ScanResult>,
    latest_scan_id: RwLock<Option<String>>,
    stats: RwLock<Stats>,
    dataset: DatasetInfo,
    models: Vec<ModelPerformance>,
    next_intrusion_id: AtomicI64,
    next_chat_id: AtomicI64,
}

impl MemStore {
    /// Build a store seeded with the demo fixture data: the five-type attack
    /// taxonomy, 25 security tips, 50 synthetic intrusions spread over the
    /// past week, and the dataset/model constants.
    pub fn new() -> Self {
        let store = Self {
            attack_types: seed_attack_types(),
            security_tips: seed_security_tips(),
            intrusions: DashMap::new(),
            chat_sessions: DashMap::new(),
            scans: DashMap::new(),
            latest_scan_id: RwLock::new(None),
            stats: RwLock::new(Stats {
                total_requests: 1500,
                attacks_detected: 250,
                model_accuracy: 85,
                request_increase: 12,
                attack_increase: 8,
                accuracy_improvement: 3,
                updated_at: Utc::now(),
            }),
            dataset: DatasetInfo {
                name: "KDD Cup 1999".to_string(),
                total_records: 4_898_431,
                attack_classes: 5,
                features: 41,
            },
            models: seed_model_performance(),
            next_intrusion_id: AtomicI64::new(1),
            next_chat_id: AtomicI64::new(1),
        };
        store.seed_intrusions();
        store
    }

    fn seed_intrusions(&self) {
        let mut rng = rand::thread_rng();
        let now = Utc::now();

        for _ in 0..SEEDED_INTRUSIONS {
            let attack_type_id = rng.gen_range(1..=5i64);
            let (lo, hi) = CONFIDENCE_BANDS[(attack_type_id - 1) as usize];
            let confidence = rng.gen_range(lo..=hi);
            let status = SEED_STATUSES.choose(&mut rng).unwrap().to_string();
            let prefix = IP_PREFIXES.choose(&mut rng).unwrap();
            let source_ip = format!("{}{}", prefix, rng.gen_range(0..255));

            let timestamp = now
                - Duration::days(rng.gen_range(0..7))
                - Duration::hours(rng.gen_range(0..24))
                - Duration::minutes(rng.gen_range(0..60));

            let details = seed_detail(attack_type_id, confidence);
            let id = self.next_intrusion_id.fetch_add(1, Ordering::Relaxed);
            self.intrusions.insert(
                id,
                Intrusion {
                    id,
                    timestamp,
                    source_ip,
                    attack_type_id,
                    confidence,
                    status,
                    details: Some(details),
                },
            );
        }
    }

    // ── Attack types ─────────────────────────────────────────────────────────

    pub fn attack_types(&self) -> &[AttackType] {
        &self.attack_types
    }

    pub fn attack_type(&self, id: i64) -> Option<&AttackType> {
        self.attack_types.iter().find(|at| at.id == id)
    }

    // ── Intrusions ───────────────────────────────────────────────────────────

    /// Paginated, filtered intrusion listing, newest first.
    ///
    /// `attack_type` filters by case-insensitive substring match on the attack
    /// type name; `status` by case-insensitive equality. The literal `"all"`
    /// (or absence) disables a filter. A page past the end returns an empty
    /// item list, not an error.
    pub fn list_intrusions(
        &self,
        page: usize,
        limit: usize,
        attack_type: Option<&str>,
        status: Option<&str>,
    ) -> IntrusionPage {
        let page = page.max(1);
        let limit = limit.max(1);

        let mut rows: Vec<Intrusion> = self.intrusions.iter().map(|e| e.value().clone()).collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if let Some(filter) = attack_type.filter(|f| !f.is_empty() && *f != "all") {
            let needle = filter.to_lowercase();
            rows.retain(|i| {
                self.attack_type(i.attack_type_id)
                    .map(|at| at.name.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            });
        }

        if let Some(filter) = status.filter(|f| !f.is_empty() && *f != "all") {
            let wanted = filter.to_lowercase();
            rows.retain(|i| i.status.to_lowercase() == wanted);
        }

        let total = rows.len();
        let pages = total.div_ceil(limit);
        let start = (page - 1) * limit;

        let intrusions = rows
            .into_iter()
            .skip(start)
            .take(limit)
            .map(|i| self.with_type(i))
            .collect();

        IntrusionPage {
            intrusions,
            total,
            page,
            pages,
        }
    }

    pub fn intrusion_by_id(&self, id: i64) -> Option<IntrusionWithType> {
        self.intrusions
            .get(&id)
            .map(|e| self.with_type(e.value().clone()))
    }

    pub fn create_intrusion(
        &self,
        source_ip: String,
        attack_type_id: i64,
        confidence: i32,
        status: String,
        details: Option<String>,
    ) -> Intrusion {
        let id = self.next_intrusion_id.fetch_add(1, Ordering::Relaxed);
        let intrusion = Intrusion {
            id,
            timestamp: Utc::now(),
            source_ip,
            attack_type_id,
            confidence,
            status,
            details,
        };
        self.intrusions.insert(id, intrusion.clone());
        intrusion
    }

    /// Set the status of an intrusion. Any string is accepted and stored
    /// verbatim; status values are not an enforced enum.
    pub fn update_intrusion_status(&self, id: i64, status: String) -> Option<Intrusion> {
        self.intrusions.get_mut(&id).map(|mut e| {
            e.status = status;
            e.value().clone()
        })
    }

    fn with_type(&self, intrusion: Intrusion) -> IntrusionWithType {
        let (attack_type, attack_type_class) = match self.attack_type(intrusion.attack_type_id) {
            Some(at) => (at.name.clone(), at.class_name.clone()),
            None => (
                "Unknown".to_string(),
                "bg-purple-500/20 text-purple-400".to_string(),
            ),
        };
        IntrusionWithType {
            id: intrusion.id,
            timestamp: intrusion.timestamp,
            source_ip: intrusion.source_ip,
            confidence: intrusion.confidence,
            status_class: status_class(&intrusion.status).to_string(),
            status: intrusion.status,
            details: intrusion.details,
            attack_type,
            attack_type_class,
        }
    }

    // ── Dashboard aggregates ─────────────────────────────────────────────────

    /// Per-type intrusion counts over a trailing window ending now.
    pub fn attack_distribution(&self, range: TimeRange) -> AttackDistribution {
        let start = range.window_start(Utc::now());
        let in_window: Vec<i64> = self
            .intrusions
            .iter()
            .filter(|e| e.value().timestamp >= start)
            .map(|e| e.value().attack_type_id)
            .collect();

        let distribution = self
            .attack_types
            .iter()
            .map(|at| AttackDistributionItem {
                name: at.name.clone(),
                count: in_window.iter().filter(|&&id| id == at.id).count(),
                color: color_hex(&at.color).to_string(),
            })
            .collect();

        AttackDistribution {
            time_range: range.as_str().to_string(),
            distribution,
        }
    }

    /// Per-type counts sorted most-frequent first. The `change` percentage is
    /// a random placeholder, regenerated per call.
    pub fn recent_attack_types(&self) -> Vec<RecentAttackTypeItem> {
        let mut rng = rand::thread_rng();
        let mut items: Vec<RecentAttackTypeItem> = self
            .attack_types
            .iter()
            .map(|at| {
                let count = self
                    .intrusions
                    .iter()
                    .filter(|e| e.value().attack_type_id == at.id)
                    .count();
                RecentAttackTypeItem {
                    id: at.id.to_string(),
                    name: at.name.clone(),
                    count,
                    change: rng.gen_range(1..=20),
                    icon: at.icon.clone(),
                    color: format!("bg-{}-500/20", at.color),
                    border_color: format!("border-{}-500", at.color),
                }
            })
            .collect();
        items.sort_by(|a, b| b.count.cmp(&a.count));
        items
    }

    // ── Security tips / education ────────────────────────────────────────────

    pub fn security_tips_for(&self, attack_type_id: i64) -> Vec<SecurityTip> {
        self.security_tips
            .iter()
            .filter(|t| t.attack_type_id == attack_type_id)
            .cloned()
            .collect()
    }

    pub fn education_info(&self) -> Vec<SecurityInfoItem> {
        self.attack_types
            .iter()
            .map(|at| SecurityInfoItem {
                id: at.id.to_string(),
                name: at.name.clone(),
                description: at.description.clone(),
                tips: self
                    .security_tips_for(at.id)
                    .into_iter()
                    .map(|t| TipItem {
                        id: t.id.to_string(),
                        tip: t.tip,
                    })
                    .collect(),
                color: at.color.clone(),
                gradient: format!("bg-gradient-to-r from-{0}-500 to-{0}-700", at.color),
                icon: at.icon.clone(),
                icon_class: format!(
                    "bg-{0}-500/20 rounded-full flex items-center justify-center text-{0}-500",
                    at.color
                ),
            })
            .collect()
    }

    // ── Chat transcripts ─────────────────────────────────────────────────────

    pub fn session_messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.chat_sessions
            .get(session_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn append_chat_message(&self, session_id: &str, role: &str, content: &str) -> ChatMessage {
        let message = ChatMessage {
            id: self.next_chat_id.fetch_add(1, Ordering::Relaxed),
            session_id: session_id.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        self.chat_sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    // ── Scans ────────────────────────────────────────────────────────────────

    pub fn record_scan(&self, result: ScanResult) {
        *self.latest_scan_id.write().expect("latest_scan_id poisoned") = Some(result.id.clone());
        self.scans.insert(result.id.clone(), result);
    }

    pub fn latest_scan(&self) -> Option<ScanResult> {
        let id = self
            .latest_scan_id
            .read()
            .expect("latest_scan_id poisoned")
            .clone()?;
        self.scans.get(&id).map(|e| e.value().clone())
    }

    // ── Stats / dataset ──────────────────────────────────────────────────────

    pub fn get_stats(&self) -> Stats {
        self.stats.read().expect("stats poisoned").clone()
    }

    /// Overwrite the stats singleton wholesale; never recomputed from
    /// intrusion data.
    pub fn update_stats(&self, update: StatsUpdate) -> Stats {
        let mut stats = self.stats.write().expect("stats poisoned");
        *stats = Stats {
            total_requests: update.total_requests,
            attacks_detected: update.attacks_detected,
            model_accuracy: update.model_accuracy,
            request_increase: update.request_increase,
            attack_increase: update.attack_increase,
            accuracy_improvement: update.accuracy_improvement,
            updated_at: Utc::now(),
        };
        stats.clone()
    }

    pub fn dataset_info(&self) -> DatasetInfoResponse {
        DatasetInfoResponse {
            dataset_info: self.dataset.clone(),
            models: self.models.clone(),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Presentation helpers
// ──────────────────────────────────────────────────────────────────────────────

pub fn status_class(status: &str) -> &'static str {
    match status.to_lowercase().as_str() {
        "blocked" => "bg-red-500/20 text-red-400",
        "monitoring" => "bg-amber-500/20 text-amber-400",
        "resolved" => "bg-green-500/20 text-green-400",
        "investigating" => "bg-amber-500/20 text-amber-400",
        _ => "bg-purple-500/20 text-purple-400",
    }
}

fn color_hex(color: &str) -> &'static str {
    match color {
        "red" => "#FF5555",
        "amber" => "#FFDF00",
        "green" => "#39FF14",
        "blue" => "#3B82F6",
        "purple" => "#A855F7",
        _ => "#39FF14",
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Seed data
// ──────────────────────────────────────────────────────────────────────────────

fn seed_attack_types() -> Vec<AttackType> {
    let rows = [
        (
            "DoS Attack",
            "Denial of Service attacks overwhelm systems with traffic or requests, making services unavailable to legitimate users.",
            "red",
            "bg-red-500/20 text-red-400",
            "fas fa-skull-crossbones",
        ),
        (
            "Probe Attack",
            "Reconnaissance attacks that scan networks for vulnerabilities, open ports, and services that can be exploited later.",
            "amber",
            "bg-amber-500/20 text-amber-400",
            "fas fa-user-secret",
        ),
        (
            "R2L Attack",
            "Remote to Local attacks where attackers gain unauthorized access from a remote machine to a local account or service.",
            "green",
            "bg-green-500/20 text-green-400",
            "fas fa-laptop-code",
        ),
        (
            "U2R Attack",
            "User to Root attacks where attackers attempt to gain root/administrator access to systems starting with a normal user account.",
            "blue",
            "bg-blue-500/20 text-blue-400",
            "fas fa-user-lock",
        ),
        (
            "Unknown",
            "Unidentified or novel attack patterns that don't match known signatures but exhibit suspicious behavior.",
            "purple",
            "bg-purple-500/20 text-purple-400",
            "fas fa-question-circle",
        ),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, (name, description, color, class_name, icon))| AttackType {
            id: i as i64 + 1,
            name: name.to_string(),
            description: description.to_string(),
            color: color.to_string(),
            class_name: class_name.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

fn seed_security_tips() -> Vec<SecurityTip> {
    let tips_by_type: [(i64, [&str; 5]); 5] = [
        (
            1,
            [
                "Implement rate limiting on your services",
                "Use DDoS protection services",
                "Configure network to handle traffic spikes",
                "Set up traffic monitoring to detect unusual patterns",
                "Have a response plan ready for mitigation",
            ],
        ),
        (
            2,
            [
                "Keep systems updated with security patches",
                "Close unnecessary network ports",
                "Use firewalls to block suspicious scanning",
                "Implement intrusion detection systems",
                "Monitor network traffic for scanning patterns",
            ],
        ),
        (
            3,
            [
                "Implement strong authentication methods",
                "Use encryption for sensitive communications",
                "Regularly monitor access logs for anomalies",
                "Apply the principle of least privilege",
                "Implement multi-factor authentication",
            ],
        ),
        (
            4,
            [
                "Regularly audit user permissions and access",
                "Apply security patches promptly",
                "Use privilege separation techniques",
                "Implement behavior-based monitoring",
                "Use application whitelisting",
            ],
        ),
        (
            5,
            [
                "Employ behavior-based intrusion detection",
                "Maintain up-to-date threat intelligence",
                "Implement honeypots to detect novel attacks",
                "Use AI-based security monitoring",
                "Regularly update security rules",
            ],
        ),
    ];

    let mut id = 1i64;
    let mut out = Vec::with_capacity(25);
    for (attack_type_id, tips) in tips_by_type {
        for tip in tips {
            out.push(SecurityTip {
                id,
                attack_type_id,
                tip: tip.to_string(),
            });
            id += 1;
        }
    }
    out
}

fn seed_model_performance() -> Vec<ModelPerformance> {
    [
        ("SVM with SMOTE", 85, 87, 83, 85),
        ("Random Forest", 82, 80, 81, 80),
        ("Deep Neural Network", 88, 86, 89, 87),
        ("Bayesian Network", 79, 75, 80, 77),
    ]
    .iter()
    .map(|(name, accuracy, precision, recall, f1)| ModelPerformance {
        name: name.to_string(),
        accuracy: *accuracy,
        precision: *precision,
        recall: *recall,
        f1_score: *f1,
    })
    .collect()
}

fn seed_detail(attack_type_id: i64, confidence: i32) -> String {
    match attack_type_id {
        1 => format!(
            "Detected {confidence}% confidence match with signature database. Multiple packets with malformed headers received from this IP."
        ),
        2 => "This IP has been observed scanning multiple ports (21, 22, 80, 443) in quick succession.".to_string(),
        3 => "Unusual authentication patterns detected. Multiple failed login attempts followed by successful login.".to_string(),
        4 => "Privilege escalation attempt detected. User attempted to execute commands requiring root access.".to_string(),
        _ => "Unusual network traffic patterns detected from this IP. Traffic doesn't match known attack signatures but exhibits anomalous behavior.".to_string(),
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
