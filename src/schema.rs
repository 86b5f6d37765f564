//! Column-name constants and value vocabularies for the canonical equipment
//! schema. Single source of truth - no column-name literals in the logic.

// ── Source columns ──────────────────────────────────────────────────────────
pub mod equipment {
    pub const EQUIPMENT_DESCRIPTION: &str = "Equipment Description";
    pub const VENDOR: &str = "Vendor";
    pub const CURRENT_STATUS: &str = "Current Status";
    pub const CATEGORY: &str = "Category";
    pub const PHASE: &str = "Phase";
    pub const PAYMENT_TYPE: &str = "Payment Type";
    pub const BILLING_BASIS: &str = "Billing Basis";
    pub const LAST_INSPECTION_DATE: &str = "Last Inspection Date";
    pub const NEXT_INSPECTION_DUE: &str = "Next Inspection Due";
    pub const MOBILIZATION_DATE: &str = "Mobilization Date";
    pub const PLANNED_DEMOB_DATE: &str = "Planned Demob Date";
    pub const ACTUAL_DEMOB_DATE: &str = "Actual Demob Date";
    pub const UNIT_RATE: &str = "Unit Rate";
    pub const QUANTITY: &str = "Quantity";
    pub const PLANNED_DURATION_DAYS: &str = "Planned Duration (Days)";

    /// Columns parsed as datetimes during normalization (when present).
    pub const DATE_COLUMNS: [&str; 5] = [
        LAST_INSPECTION_DATE,
        NEXT_INSPECTION_DUE,
        MOBILIZATION_DATE,
        PLANNED_DEMOB_DATE,
        ACTUAL_DEMOB_DATE,
    ];

    /// Columns coerced to floats during normalization (when present).
    pub const NUMERIC_COLUMNS: [&str; 3] = [UNIT_RATE, QUANTITY, PLANNED_DURATION_DAYS];

    /// Categorical columns whose cell values get whitespace-trimmed.
    pub const CATEGORICAL_COLUMNS: [&str; 6] = [
        VENDOR,
        CURRENT_STATUS,
        CATEGORY,
        PHASE,
        PAYMENT_TYPE,
        BILLING_BASIS,
    ];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const DAYS_ONSITE: &str = "Days Onsite";
    pub const DURATION_VARIANCE: &str = "Duration Variance";
    pub const ESTIMATED_TOTAL_COST: &str = "Estimated Total Cost";
}

// ── Billing basis values ────────────────────────────────────────────────────
pub mod billing {
    pub const DAILY: &str = "Daily";
    pub const WEEKLY: &str = "Weekly";
    pub const MONTHLY: &str = "Monthly";
}

// ── Status substrings for KPI counting ──────────────────────────────────────
// Matched case-insensitively as substrings, so "Active - Night Shift" still
// counts as active. Filter equality is a separate, exact-match concern.
pub mod status {
    pub const ACTIVE: &str = "Active";
    pub const IDLE: &str = "Idle";
    pub const MAINTENANCE: &str = "Maintenance";
}

// ── Filter dimensions ───────────────────────────────────────────────────────
pub mod filters {
    use super::equipment;

    /// Sentinel option meaning "unconstrained" for a dimension.
    pub const ALL: &str = "All";

    pub const DIMENSIONS: [&str; 5] = [
        equipment::VENDOR,
        equipment::CURRENT_STATUS,
        equipment::CATEGORY,
        equipment::PAYMENT_TYPE,
        equipment::PHASE,
    ];
}

// ── Header aliases across site variants ─────────────────────────────────────
// The two deployed spreadsheet variants drifted apart; this table maps every
// known variant header to its canonical name. Resolved once at normalization
// time, and only when the canonical column is not itself present.
pub mod aliases {
    use super::equipment;

    pub const TABLE: [(&str, &str); 16] = [
        ("Equipment Name", equipment::EQUIPMENT_DESCRIPTION),
        ("Description", equipment::EQUIPMENT_DESCRIPTION),
        ("Supplier", equipment::VENDOR),
        ("Status", equipment::CURRENT_STATUS),
        ("Equipment Category", equipment::CATEGORY),
        ("Project Phase", equipment::PHASE),
        ("Payment Terms", equipment::PAYMENT_TYPE),
        ("Rate Basis", equipment::BILLING_BASIS),
        ("Last Inspection", equipment::LAST_INSPECTION_DATE),
        ("Inspection Due", equipment::NEXT_INSPECTION_DUE),
        ("Mob Date", equipment::MOBILIZATION_DATE),
        ("Planned Demob", equipment::PLANNED_DEMOB_DATE),
        ("Actual Demob", equipment::ACTUAL_DEMOB_DATE),
        ("Rate", equipment::UNIT_RATE),
        ("Qty", equipment::QUANTITY),
        ("Planned Duration", equipment::PLANNED_DURATION_DAYS),
    ];
}

// ── Export table headers ────────────────────────────────────────────────────
pub mod export {
    pub const EQUIPMENT_COUNT: &str = "Equipment Count";
    pub const TOTAL_COST: &str = "Total Cost";
    pub const AVG_DAYS_ONSITE: &str = "Avg Days Onsite";

    pub const VALUE: &str = "Value";
    pub const COUNT: &str = "Count";

    pub const REPORT_GENERATED: &str = "Report Generated";
    pub const TOTAL_EQUIPMENT: &str = "Total Equipment";
    pub const ACTIVE_EQUIPMENT: &str = "Active Equipment";
    pub const TOTAL_VENDORS: &str = "Total Vendors";
    pub const TOTAL_ESTIMATED_COST: &str = "Total Estimated Cost";
}
