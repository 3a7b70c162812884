use crate::error::{Error, ErrorKind, Result};
use crate::models::{HrefText, SearchCacheRecord};
use exn::ResultExt;
use time::UtcDateTime;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SearchCacheRow {
    pub(crate) book_id: String,
    pub(crate) version: i64,
    pub(crate) href_text: String,
    pub(crate) updated_at: i64,
}
impl SearchCacheRow {
    pub(crate) fn new(book_id: impl Into<String>, record: &SearchCacheRecord) -> Result<Self> {
        Ok(Self {
            book_id: book_id.into(),
            version: i64::from(record.version),
            href_text: serde_json::to_string(&record.href_text).or_raise(|| ErrorKind::InvalidData("href text"))?,
            updated_at: record.updated_at.unix_timestamp(),
        })
    }
}
impl TryFrom<SearchCacheRow> for SearchCacheRecord {
    type Error = Error;
    fn try_from(row: SearchCacheRow) -> Result<Self> {
        Ok(Self {
            version: u32::try_from(row.version).or_raise(|| ErrorKind::InvalidData("version"))?,
            href_text: serde_json::from_str::<HrefText>(&row.href_text)
                .or_raise(|| ErrorKind::InvalidData("href text"))?,
            updated_at: UtcDateTime::from_unix_timestamp(row.updated_at)
                .or_raise(|| ErrorKind::InvalidData("updated at"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(version: i64, href_text: &str) -> SearchCacheRow {
        SearchCacheRow {
            book_id: "book".to_string(),
            version,
            href_text: href_text.to_string(),
            updated_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_row_to_model_keeps_order() {
        let record = SearchCacheRecord::try_from(row(3, r#"{"c2.xhtml":"second","c1.xhtml":"first"}"#)).unwrap();
        assert_eq!(record.version, 3);
        assert_eq!(record.href_text.keys().collect::<Vec<_>>(), ["c2.xhtml", "c1.xhtml"]);
        assert_eq!(record.updated_at.unix_timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_model_to_row() {
        let record = SearchCacheRecord::new(HrefText::from([("a.xhtml".to_string(), "Alpha".to_string())]));
        let row = SearchCacheRow::new("book", &record).unwrap();
        assert_eq!(row.version, 3);
        assert_eq!(row.href_text, r#"{"a.xhtml":"Alpha"}"#);
    }

    #[rstest]
    #[case::not_json(3, "not json")]
    #[case::wrong_shape(3, r#"["a.xhtml","Alpha"]"#)]
    #[case::non_string_text(3, r#"{"a.xhtml":42}"#)]
    #[case::negative_version(-1, "{}")]
    fn test_invalid_rows(#[case] version: i64, #[case] href_text: &str) {
        let err = SearchCacheRecord::try_from(row(version, href_text)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }
}
