//! Course field names accepted in upload files

/// Fields that must appear in every header row
pub const REQUIRED_FIELDS: [&str; 2] = ["fullname", "shortname"];

/// Fields whose run-level defaults come from the import configuration
pub const DEFAULT_FIELDS: [&str; 14] = [
    "format",
    "numsections",
    "startdate",
    "hiddensections",
    "newsitems",
    "showgrades",
    "showreports",
    "maxbytes",
    "groupmode",
    "groupmodeforce",
    "defaultgroupingid",
    "visible",
    "lang",
    "summaryformat",
];

/// Every column name a header row may use (canonical, lower-case)
pub const ALLOWED_FIELDS: [&str; 34] = [
    "fullname",
    "shortname",
    "category",
    "sortorder",
    "summary",
    "summaryformat",
    "format",
    "showgrades",
    "newsitems",
    "startdate",
    "numsections",
    "maxbytes",
    "visible",
    "groupmode",
    "timecreated",
    "timemodified",
    "idnumber",
    "password",
    "enrolperiod",
    "groupmodeforce",
    "lang",
    "theme",
    "cost",
    "showreports",
    "guest",
    "enrollable",
    "enrolstartdate",
    "enrolenddate",
    "notifystudents",
    "template",
    "expirynotify",
    "expirythreshold",
    "hiddensections",
    "defaultgroupingid",
];

/// Header row suggested by `cupload template`
pub const TEMPLATE_FIELDS: [&str; 6] = [
    "shortname",
    "fullname",
    "category",
    "idnumber",
    "summary",
    "startdate",
];

/// Check whether a canonical name is in the allow-list
pub fn is_allowed(field: &str) -> bool {
    ALLOWED_FIELDS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_default_fields_are_allowed() {
        for field in REQUIRED_FIELDS.iter().chain(DEFAULT_FIELDS.iter()) {
            assert!(is_allowed(field), "{} should be allowed", field);
        }
    }

    #[test]
    fn test_allowed_fields_are_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for field in ALLOWED_FIELDS {
            assert_eq!(field, field.to_lowercase());
            assert!(seen.insert(field), "duplicate field {}", field);
        }
    }
}
