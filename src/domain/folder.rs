//! Category-to-folder mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Category;

/// Name of the folder new mail arrives in.
pub const INBOX: &str = "INBOX";

/// Static association from triage category to mailbox folder name.
///
/// The mapping is read-only once loaded. Lookups for a category without an
/// entry fall back to the folder for [`Category::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderMapping {
    folders: BTreeMap<Category, String>,
}

impl Default for FolderMapping {
    fn default() -> Self {
        let folders = [
            (Category::Urgent, "Urgent"),
            (Category::Important, "Important"),
            (Category::Newsletter, "Newsletters"),
            (Category::Promotional, "Promotions"),
            (Category::OtpReceipt, "Receipts"),
            (Category::Other, "Archive"),
        ]
        .into_iter()
        .map(|(category, folder)| (category, folder.to_string()))
        .collect();

        Self { folders }
    }
}

impl FolderMapping {
    /// Builds a mapping from explicit pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Category, S)>,
        S: Into<String>,
    {
        Self {
            folders: pairs
                .into_iter()
                .map(|(category, folder)| (category, folder.into()))
                .collect(),
        }
    }

    /// Folder for a category, falling back to the `OTHER` folder, then to INBOX.
    pub fn folder_for(&self, category: Category) -> &str {
        self.folders
            .get(&category)
            .or_else(|| self.folders.get(&Category::Other))
            .map(String::as_str)
            .unwrap_or(INBOX)
    }

    /// Iterates over `(category, folder)` pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> {
        self.folders.iter().map(|(c, f)| (*c, f.as_str()))
    }

    /// Distinct folder names, in category order.
    pub fn folders(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for folder in self.folders.values() {
            if !seen.contains(&folder.as_str()) {
                seen.push(folder.as_str());
            }
        }
        seen
    }

    /// INBOX followed by every mapped folder that isn't INBOX.
    pub fn view_folders(&self) -> Vec<&str> {
        let mut folders = vec![INBOX];
        folders.extend(
            self.folders()
                .into_iter()
                .filter(|f| !f.eq_ignore_ascii_case(INBOX)),
        );
        folders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mapping_matches_categories() {
        let mapping = FolderMapping::default();
        assert_eq!(mapping.folder_for(Category::Urgent), "Urgent");
        assert_eq!(mapping.folder_for(Category::Newsletter), "Newsletters");
        assert_eq!(mapping.folder_for(Category::OtpReceipt), "Receipts");
        assert_eq!(mapping.folder_for(Category::Other), "Archive");
    }

    #[test]
    fn missing_category_falls_back_to_other() {
        let mapping = FolderMapping::from_pairs([(Category::Other, "Later")]);
        assert_eq!(mapping.folder_for(Category::Promotional), "Later");

        let empty = FolderMapping::from_pairs(Vec::<(Category, String)>::new());
        assert_eq!(empty.folder_for(Category::Urgent), INBOX);
    }

    #[test]
    fn view_folders_start_with_inbox() {
        let mapping = FolderMapping::from_pairs([
            (Category::Other, "INBOX"),
            (Category::Newsletter, "News"),
            (Category::Promotional, "News"),
        ]);
        assert_eq!(mapping.view_folders(), vec!["INBOX", "News"]);
    }

    #[test]
    fn mapping_serialization() {
        let mapping = FolderMapping::default();
        let json = serde_json::to_string(&mapping).unwrap();
        assert!(json.contains("\"OTP_RECEIPT\":\"Receipts\""));

        let back: FolderMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}
