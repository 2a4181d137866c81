/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render the operator-facing advisory text printed beneath
    apt's own output.

  Security / Safety Notes:
    Pure string assembly; printing is left to the caller.

  Dependencies:
    None beyond std.

  Operational Scope:
    Used by the entry point after classification or diffing.

  Revision History:
    2025-11-12 COD  Authored advisory rendering.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Stable wording for operators and log scrapers
============================================================*/

use crate::classifier::SecurityCounts;
use crate::diff::RestrictedChannel;
use crate::host::CloudId;

const WRAP_WIDTH: usize = 79;

/// "N standard LTS security updates, N esm-infra ... and N esm-apps ...".
pub fn count_message(counts: &SecurityCounts) -> String {
    let parts: Vec<String> = [
        (counts.standard, "standard LTS"),
        (counts.esm_infra, "esm-infra"),
        (counts.esm_apps, "esm-apps"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| {
        let noun = if count == 1 { "update" } else { "updates" };
        format!("{count} {label} security {noun}")
    })
    .collect();

    match parts.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Package names indented by a space, wrapped before the terminal edge.
pub fn wrap_package_names(names: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::from(" ");
    for name in names {
        if current.len() + 1 + name.len() >= WRAP_WIDTH {
            lines.push(std::mem::replace(&mut current, String::from(" ")));
        }
        current.push(' ');
        current.push_str(name);
    }
    if current.len() > 1 {
        lines.push(current);
    }
    lines
}

/// Link to the Pro landing page best matching the release and cloud.
pub fn learn_more_line(codename: &str, cloud: CloudId) -> String {
    let (qualifier, url) = match (codename, cloud) {
        ("xenial", CloudId::Azure) => ("for 16.04 on Azure ", "https://ubuntu.com/16-04/azure"),
        ("xenial", _) => ("for 16.04 ", "https://ubuntu.com/16-04"),
        ("bionic", CloudId::Azure) => ("for 18.04 on Azure ", "https://ubuntu.com/18-04/azure"),
        ("bionic", _) => ("for 18.04 ", "https://ubuntu.com/18-04"),
        (_, CloudId::Azure) => ("on Azure ", "https://ubuntu.com/azure/pro"),
        (_, CloudId::Aws) => ("on AWS ", "https://ubuntu.com/aws/pro"),
        (_, CloudId::Gce) => ("on GCP ", "https://ubuntu.com/gcp/pro"),
        (_, CloudId::None) => ("", "https://ubuntu.com/pro"),
    };
    format!("Learn more about Ubuntu Pro {qualifier}at {url}")
}

/// Advisory for updates held back in an ESM channel.
pub fn esm_packages_notice(
    channel: RestrictedChannel,
    names: &[String],
    codename: &str,
    cloud: CloudId,
) -> String {
    let single = names.len() == 1;
    let heading = match (channel, single) {
        (RestrictedChannel::Apps, true) => {
            "Get another security update through Ubuntu Pro with 'esm-apps' enabled:"
        }
        (RestrictedChannel::Apps, false) => {
            "Get more security updates through Ubuntu Pro with 'esm-apps' enabled:"
        }
        (RestrictedChannel::Infra, true) => {
            "The following security update requires Ubuntu Pro with 'esm-infra' enabled:"
        }
        (RestrictedChannel::Infra, false) => {
            "The following security updates require Ubuntu Pro with 'esm-infra' enabled:"
        }
    };

    let mut lines = vec![heading.to_string()];
    lines.extend(wrap_package_names(names));
    lines.push(learn_more_line(codename, cloud));
    lines.join("\n")
}

/// Advisory for upgrades that need a lapsed subscription.
pub fn expired_packages_notice(names: &[String]) -> String {
    let mut lines = vec![
        "The following packages will fail to download because your Ubuntu Pro subscription has expired"
            .to_string(),
    ];
    lines.extend(wrap_package_names(names));
    lines.push("Renew your subscription or `sudo pro detach` to remove these errors".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(standard: usize, esm_infra: usize, esm_apps: usize) -> SecurityCounts {
        SecurityCounts {
            standard,
            esm_infra,
            esm_apps,
        }
    }

    #[test]
    fn count_message_pluralises_and_joins() {
        assert_eq!(count_message(&counts(0, 0, 0)), "");
        assert_eq!(count_message(&counts(1, 0, 0)), "1 standard LTS security update");
        assert_eq!(count_message(&counts(0, 2, 0)), "2 esm-infra security updates");
        assert_eq!(
            count_message(&counts(1, 0, 1)),
            "1 standard LTS security update and 1 esm-apps security update"
        );
        assert_eq!(
            count_message(&counts(3, 1, 2)),
            "3 standard LTS security updates, 1 esm-infra security update and 2 esm-apps security updates"
        );
    }

    #[test]
    fn names_wrap_before_79_columns() {
        let names: Vec<String> = (0..30).map(|i| format!("package{i:02}")).collect();
        let lines = wrap_package_names(&names);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() < WRAP_WIDTH, "{line}");
            assert!(line.starts_with("  package"));
        }
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.len(), names.len());
        assert!(wrap_package_names(&[]).is_empty());
    }

    #[test]
    fn learn_more_prefers_release_then_cloud() {
        assert_eq!(
            learn_more_line("xenial", CloudId::Azure),
            "Learn more about Ubuntu Pro for 16.04 on Azure at https://ubuntu.com/16-04/azure"
        );
        assert_eq!(
            learn_more_line("bionic", CloudId::Aws),
            "Learn more about Ubuntu Pro for 18.04 at https://ubuntu.com/18-04"
        );
        assert_eq!(
            learn_more_line("jammy", CloudId::Gce),
            "Learn more about Ubuntu Pro on GCP at https://ubuntu.com/gcp/pro"
        );
        assert_eq!(
            learn_more_line("noble", CloudId::None),
            "Learn more about Ubuntu Pro at https://ubuntu.com/pro"
        );
    }

    #[test]
    fn esm_notice_uses_singular_heading() {
        let text = esm_packages_notice(
            RestrictedChannel::Infra,
            &["openssl".to_string()],
            "xenial",
            CloudId::None,
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "The following security update requires Ubuntu Pro with 'esm-infra' enabled:"
        );
        assert_eq!(lines[1], "  openssl");
        assert!(lines[2].contains("16-04"));
    }

    #[test]
    fn expired_notice_lists_packages() {
        let text = expired_packages_notice(&["a".to_string(), "b".to_string()]);
        assert!(text.contains("\n  a b\n"));
        assert!(text.ends_with("to remove these errors"));
    }
}
