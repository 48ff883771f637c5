//! Statically known stages that exist regardless of the activity schedule.

use chrono::Weekday;
use chrono::Weekday::{Fri, Mon, Sat, Sun, Thu, Tue, Wed};

// ============================================================================
// Open-day tables
// ============================================================================

/// Every day (empty table)
const DAILY: &[Weekday] = &[];

const CE_DAYS: &[Weekday] = &[Tue, Thu, Sat, Sun];
const CA_DAYS: &[Weekday] = &[Tue, Wed, Fri, Sun];
const AP_DAYS: &[Weekday] = &[Mon, Thu, Sat, Sun];
const SK_DAYS: &[Weekday] = &[Mon, Wed, Fri, Sat];

const PR_A_DAYS: &[Weekday] = &[Mon, Thu, Fri, Sun];
const PR_B_DAYS: &[Weekday] = &[Mon, Tue, Fri, Sat];
const PR_C_DAYS: &[Weekday] = &[Wed, Thu, Sat, Sun];
const PR_D_DAYS: &[Weekday] = &[Tue, Wed, Sat, Sun];

/// Code prefixes whose open days are extended by a resource-collection window
const RESOURCE_PREFIXES: [&str; 6] = ["CE-", "LS-", "CA-", "AP-", "SK-", "PR-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCategory {
    Main,
    ResourceCe,
    ResourceLs,
    ResourceCa,
    ResourceAp,
    ResourceSk,
    ChipPr,
    Annihilation,
    Event,
    Other,
}

impl StageCategory {
    pub fn from_code(code: &str) -> Self {
        match code {
            c if c.starts_with("CE-") => StageCategory::ResourceCe,
            c if c.starts_with("LS-") => StageCategory::ResourceLs,
            c if c.starts_with("CA-") => StageCategory::ResourceCa,
            c if c.starts_with("AP-") => StageCategory::ResourceAp,
            c if c.starts_with("SK-") => StageCategory::ResourceSk,
            c if c.starts_with("PR-") => StageCategory::ChipPr,
            c if c == "Annihilation" || c.contains("@Annihilation") => StageCategory::Annihilation,
            c if is_main_code(c) => StageCategory::Main,
            c if is_event_code(c) => StageCategory::Event,
            _ => StageCategory::Other,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StageCategory::Main => "Main Story",
            StageCategory::ResourceCe => "LMD",
            StageCategory::ResourceLs => "Battle Records",
            StageCategory::ResourceCa => "Skill Summaries",
            StageCategory::ResourceAp => "Purchase Certificates",
            StageCategory::ResourceSk => "Carbon",
            StageCategory::ChipPr => "Chips",
            StageCategory::Annihilation => "Annihilation",
            StageCategory::Event => "Event",
            StageCategory::Other => "Other",
        }
    }
}

/// `digits-digits`, e.g. `1-7`
fn is_main_code(code: &str) -> bool {
    match code.split_once('-') {
        Some((a, b)) => is_digits(a) && is_digits(b),
        None => false,
    }
}

/// Two uppercase letters, a dash, digits. e.g. `SN-10`
fn is_event_code(code: &str) -> bool {
    match code.split_once('-') {
        Some((prefix, n)) => {
            prefix.len() == 2 && prefix.bytes().all(|b| b.is_ascii_uppercase()) && is_digits(n)
        }
        None => false,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Short activity stage code: two ASCII letters, a dash, one or two digits.
/// Codes of this shape expire with their activity.
pub fn is_activity_code(code: &str) -> bool {
    match code.split_once('-') {
        Some((prefix, n)) => {
            prefix.len() == 2
                && prefix.bytes().all(|b| b.is_ascii_alphabetic())
                && (1..=2).contains(&n.len())
                && is_digits(n)
        }
        None => false,
    }
}

pub fn is_resource_stage(code: &str) -> bool {
    RESOURCE_PREFIXES.iter().any(|p| code.starts_with(p))
}

#[derive(Debug, Clone, Copy)]
pub struct PermanentStage {
    pub code: &'static str,
    pub category: StageCategory,
    /// Empty means open every day
    pub open_days: &'static [Weekday],
    pub tip: &'static str,
    pub drop_groups: &'static [&'static [&'static str]],
}

impl PermanentStage {
    const fn new(code: &'static str, category: StageCategory) -> Self {
        Self {
            code,
            category,
            open_days: DAILY,
            tip: "",
            drop_groups: &[],
        }
    }

    const fn on(mut self, open_days: &'static [Weekday], tip: &'static str) -> Self {
        self.open_days = open_days;
        self.tip = tip;
        self
    }

    const fn drops(mut self, drop_groups: &'static [&'static [&'static str]]) -> Self {
        self.drop_groups = drop_groups;
        self
    }

    pub fn display_name(&self) -> &'static str {
        display_name(self.code)
    }

    pub fn is_open_on(&self, weekday: Weekday) -> bool {
        self.open_days.is_empty() || self.open_days.contains(&weekday)
    }

    pub fn drop_groups_owned(&self) -> Vec<Vec<String>> {
        self.drop_groups
            .iter()
            .map(|group| group.iter().map(|id| id.to_string()).collect())
            .collect()
    }
}

use StageCategory::*;

/// The permanent catalog, in display order
pub const PERMANENT_STAGES: &[PermanentStage] = &[
    PermanentStage::new("1-7", Main),
    PermanentStage::new("R8-11", Other),
    PermanentStage::new("12-17-HARD", Other),
    PermanentStage::new("CE-6", ResourceCe).on(CE_DAYS, "CE-6: LMD"),
    PermanentStage::new("AP-5", ResourceAp).on(AP_DAYS, "AP-5: Purchase Certificates"),
    PermanentStage::new("CA-5", ResourceCa).on(CA_DAYS, "CA-5: Skill Summaries"),
    PermanentStage::new("LS-6", ResourceLs).on(DAILY, "LS-6: Battle Records"),
    PermanentStage::new("SK-5", ResourceSk).on(SK_DAYS, "SK-5: Carbon"),
    PermanentStage::new("Annihilation", Annihilation),
    PermanentStage::new("PR-A-1", ChipPr)
        .on(PR_A_DAYS, "PR-A-1/2: Defender & Medic chips")
        .drops(&[&["3231", "3261"], &["3232", "3262"]]),
    PermanentStage::new("PR-A-2", ChipPr).on(PR_A_DAYS, "PR-A-1/2: Defender & Medic chips"),
    PermanentStage::new("PR-B-1", ChipPr)
        .on(PR_B_DAYS, "PR-B-1/2: Caster & Sniper chips")
        .drops(&[&["3251", "3241"], &["3252", "3242"]]),
    PermanentStage::new("PR-B-2", ChipPr).on(PR_B_DAYS, "PR-B-1/2: Caster & Sniper chips"),
    PermanentStage::new("PR-C-1", ChipPr)
        .on(PR_C_DAYS, "PR-C-1/2: Vanguard & Supporter chips")
        .drops(&[&["3211", "3271"], &["3212", "3272"]]),
    PermanentStage::new("PR-C-2", ChipPr).on(PR_C_DAYS, "PR-C-1/2: Vanguard & Supporter chips"),
    PermanentStage::new("PR-D-1", ChipPr)
        .on(PR_D_DAYS, "PR-D-1/2: Guard & Specialist chips")
        .drops(&[&["3221", "3281"], &["3222", "3282"]]),
    PermanentStage::new("PR-D-2", ChipPr).on(PR_D_DAYS, "PR-D-1/2: Guard & Specialist chips"),
];

pub fn find(code: &str) -> Option<&'static PermanentStage> {
    PERMANENT_STAGES.iter().find(|s| s.code == code)
}

/// Human readable name for a stage code; the code itself when unknown
pub fn display_name(code: &str) -> &str {
    match code {
        "CE-6" => "LMD-6/5",
        "AP-5" => "Red Certificates-5",
        "CA-5" => "Skill Summaries-5",
        "LS-6" => "Battle Records-6/5",
        "SK-5" => "Carbon-5",
        "PR-A-1" => "Medic/Defender Chip",
        "PR-A-2" => "Medic/Defender Chip Pack",
        "PR-B-1" => "Caster/Sniper Chip",
        "PR-B-2" => "Caster/Sniper Chip Pack",
        "PR-C-1" => "Vanguard/Supporter Chip",
        "PR-C-2" => "Vanguard/Supporter Chip Pack",
        "PR-D-1" => "Guard/Specialist Chip",
        "PR-D-2" => "Guard/Specialist Chip Pack",
        "Annihilation" => "Current Annihilation",
        "Chernobog@Annihilation" => "Chernobog",
        "Lungmen@Annihilation" | "LungmenOutskirts@Annihilation" => "Lungmen Outskirts",
        "LungmenDowntown@Annihilation" => "Lungmen Downtown",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_code_pattern() {
        for code in ["SN-10", "ME-8", "ur-5", "Ab-1"] {
            assert!(is_activity_code(code), "{code}");
        }
        for code in ["SN-100", "S-1", "SNX-1", "SN-", "CE6", "PR-A-1", "1-7", "SN-1a"] {
            assert!(!is_activity_code(code), "{code}");
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(StageCategory::from_code("CE-6"), StageCategory::ResourceCe);
        assert_eq!(StageCategory::from_code("PR-A-1"), StageCategory::ChipPr);
        assert_eq!(StageCategory::from_code("1-7"), StageCategory::Main);
        assert_eq!(StageCategory::from_code("SN-10"), StageCategory::Event);
        assert_eq!(
            StageCategory::from_code("Chernobog@Annihilation"),
            StageCategory::Annihilation
        );
        assert_eq!(StageCategory::from_code("R8-11"), StageCategory::Other);
    }

    #[test]
    fn test_table_categories_match_codes() {
        for stage in PERMANENT_STAGES {
            assert_eq!(stage.category, StageCategory::from_code(stage.code), "{}", stage.code);
        }
    }

    #[test]
    fn test_resource_stage_prefixes() {
        assert!(is_resource_stage("CE-6"));
        assert!(is_resource_stage("PR-D-2"));
        assert!(!is_resource_stage("1-7"));
        assert!(!is_resource_stage("Annihilation"));
    }

    #[test]
    fn test_open_days() {
        let ce = find("CE-6").unwrap();
        assert!(ce.is_open_on(Weekday::Tue));
        assert!(!ce.is_open_on(Weekday::Wed));
        assert!(find("LS-6").unwrap().is_open_on(Weekday::Wed));
        assert!(find("1-7").unwrap().is_open_on(Weekday::Mon));
    }

    #[test]
    fn test_drop_groups_and_names() {
        let chip = find("PR-B-1").unwrap();
        assert_eq!(
            chip.drop_groups_owned(),
            vec![vec!["3251", "3241"], vec!["3252", "3242"]]
        );
        assert!(find("PR-B-2").unwrap().drop_groups.is_empty());
        assert_eq!(chip.display_name(), "Caster/Sniper Chip");
        assert_eq!(display_name("ZZ-99"), "ZZ-99");
    }
}
