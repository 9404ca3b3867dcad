//! Reads a raw sales document into a reporting date plus raw product entries.
//!
//! Expected shape:
//!
//! ```xml
//! <sales date="2024-05-01">
//!   <products>
//!     <product>
//!       <id>1</id><name>Pen</name><quantity>10</quantity>
//!       <price>2.0</price><category>Office</category>
//!     </product>
//!   </products>
//! </sales>
//! ```
//!
//! The parser only checks that the markup is well formed and pulls out text;
//! typing the product fields is done by [`RawProduct::into_record`].

use chrono::{Local, NaiveDate};
use common::model::sale::SaleRecord;
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("{0}")]
    Malformed(String),
    #[error("document has no <products> element")]
    MissingProducts,
}

/// Product fields as they appear in the document, untyped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProduct {
    pub id: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesDocument {
    /// The root `date` attribute, or today's date when it is absent.
    pub date: String,
    pub products: Vec<RawProduct>,
}

/// Parses the raw request body.
///
/// The body is decoded with the encoding named in the XML declaration (or its
/// byte order mark), UTF-8 when neither is present.
pub fn parse(raw: &[u8]) -> Result<SalesDocument, DocumentError> {
    let text = decode(raw)?;
    let doc = roxmltree::Document::parse(&text).map_err(|e| DocumentError::Malformed(e.to_string()))?;
    let root = doc.root_element();

    let date = root
        .attribute("date")
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().date_naive().format(DATE_FORMAT).to_string());

    let container = root
        .children()
        .find(|n| n.has_tag_name("products"))
        .ok_or(DocumentError::MissingProducts)?;

    let products = container
        .children()
        .filter(|n| n.has_tag_name("product"))
        .map(|product| {
            let field = |tag: &str| {
                product
                    .children()
                    .find(|n| n.has_tag_name(tag))
                    .and_then(|n| n.text())
                    .map(str::to_string)
            };
            RawProduct {
                id: field("id"),
                name: field("name"),
                quantity: field("quantity"),
                price: field("price"),
                category: field("category"),
            }
        })
        .collect();

    Ok(SalesDocument { date, products })
}

fn decode(raw: &[u8]) -> Result<Cow<'_, str>, DocumentError> {
    let encoding = declared_encoding(raw).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(raw);
    if had_errors {
        return Err(DocumentError::Malformed(format!(
            "document is not valid {}",
            used.name()
        )));
    }
    Ok(text)
}

/// The `encoding` pseudo-attribute of a leading `<?xml ... ?>` declaration.
fn declared_encoding(raw: &[u8]) -> Option<&'static Encoding> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let rest = raw.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&rest[..end]).ok()?;

    let after_key = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let after_eq = after_key.trim_start().strip_prefix('=')?.trim_start();
    let quote = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let label = &after_eq[1..];
    let label = &label[..label.find(quote)?];
    Encoding::for_label(label.as_bytes())
}

/// Parses a reporting date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// A product field that is absent or cannot be coerced to its type.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidField {
    pub field: &'static str,
    /// `None` when the text node is missing.
    pub value: Option<String>,
}

impl fmt::Display for InvalidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "invalid {} value '{}'", self.field, value),
            None => write!(f, "missing {}", self.field),
        }
    }
}

impl RawProduct {
    /// Coerces every field, failing on the first one that does not fit.
    pub fn into_record(self, date: NaiveDate) -> Result<SaleRecord, InvalidField> {
        let product_id = coerce("id", self.id, |v| v.parse::<i64>().ok())?;
        let name = coerce("name", self.name, non_empty)?;
        let quantity = coerce("quantity", self.quantity, |v| {
            v.parse::<i64>().ok().filter(|q| *q >= 0)
        })?;
        let price = coerce("price", self.price, |v| {
            v.parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
        })?;
        let category = coerce("category", self.category, non_empty)?;

        Ok(SaleRecord {
            date,
            product_id,
            name,
            quantity,
            price,
            category,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn coerce<T>(
    field: &'static str,
    raw: Option<String>,
    convert: impl Fn(&str) -> Option<T>,
) -> Result<T, InvalidField> {
    let raw = raw.ok_or(InvalidField { field, value: None })?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidField { field, value: None });
    }
    convert(trimmed).ok_or(InvalidField {
        field,
        value: Some(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sales_data date="2024-05-01">
  <products>
    <product>
      <id>1</id>
      <name>Pen</name>
      <quantity>10</quantity>
      <price>2.0</price>
      <category>A</category>
    </product>
    <product>
      <id>2</id>
      <name>Notebook</name>
      <quantity> 5 </quantity>
      <price>3.5</price>
      <category>B</category>
    </product>
  </products>
</sales_data>"#;

    #[test]
    fn parses_date_and_every_product() {
        let doc = parse(DOC.as_bytes()).unwrap();
        assert_eq!(doc.date, "2024-05-01");
        assert_eq!(doc.products.len(), 2);
        assert_eq!(doc.products[1].name.as_deref(), Some("Notebook"));

        let date = parse_date(&doc.date).unwrap();
        let records: Vec<SaleRecord> = doc
            .products
            .into_iter()
            .map(|p| p.into_record(date).unwrap())
            .collect();
        assert_eq!(records[0].product_id, 1);
        assert_eq!(records[0].quantity, 10);
        assert_eq!(records[1].quantity, 5);
        assert_eq!(records[1].price, 3.5);
        assert_eq!(records[1].category, "B");
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let doc = parse(b"<sales><products/></sales>").unwrap();
        assert_eq!(doc.date, Local::now().date_naive().format(DATE_FORMAT).to_string());
        assert!(doc.products.is_empty());
    }

    #[test]
    fn unclosed_tag_is_malformed() {
        let err = parse(b"<sales date=\"2024-05-01\"><products><product>").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn missing_products_container_is_rejected() {
        assert_eq!(
            parse(b"<sales date=\"2024-05-01\"/>").unwrap_err(),
            DocumentError::MissingProducts
        );
    }

    #[test]
    fn non_numeric_quantity_names_field_and_value() {
        let product = RawProduct {
            id: Some("7".into()),
            name: Some("Pen".into()),
            quantity: Some("ten".into()),
            price: Some("1.0".into()),
            category: Some("A".into()),
        };
        let err = product.into_record(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap_err();
        assert_eq!(
            err,
            InvalidField {
                field: "quantity",
                value: Some("ten".into())
            }
        );
        assert_eq!(err.to_string(), "invalid quantity value 'ten'");
    }

    #[test]
    fn missing_and_blank_fields_are_reported_as_missing() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let no_name = RawProduct {
            id: Some("1".into()),
            name: None,
            ..RawProduct::default()
        };
        assert_eq!(no_name.into_record(date).unwrap_err().field, "name");

        let blank_price = RawProduct {
            id: Some("1".into()),
            name: Some("Pen".into()),
            quantity: Some("1".into()),
            price: Some("   ".into()),
            category: Some("A".into()),
        };
        let err = blank_price.into_record(date).unwrap_err();
        assert_eq!(err.to_string(), "missing price");
    }

    #[test]
    fn negative_and_non_finite_numbers_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let base = RawProduct {
            id: Some("1".into()),
            name: Some("Pen".into()),
            quantity: Some("1".into()),
            price: Some("1".into()),
            category: Some("A".into()),
        };
        let negative = RawProduct {
            quantity: Some("-3".into()),
            ..base.clone()
        };
        assert_eq!(negative.into_record(date).unwrap_err().field, "quantity");

        let nan = RawProduct {
            price: Some("NaN".into()),
            ..base
        };
        assert_eq!(nan.into_record(date).unwrap_err().field, "price");
    }

    #[test]
    fn declared_single_byte_encoding_is_decoded() {
        let (name, _, _) = encoding_rs::WINDOWS_1251.encode("Ручка");
        let mut raw = br#"<?xml version="1.0" encoding="windows-1251"?>
<sales_data date="2024-05-01"><products><product><id>1</id><name>"#
            .to_vec();
        raw.extend_from_slice(&name);
        raw.extend_from_slice(
            b"</name><quantity>2</quantity><price>1.0</price><category>A</category></product></products></sales_data>",
        );

        let doc = parse(&raw).unwrap();
        assert_eq!(doc.products[0].name.as_deref(), Some("Ручка"));
    }

    #[test]
    fn undeclared_invalid_utf8_is_malformed() {
        let err = parse(b"<sales><products><product><name>\xFF</name></product></products></sales>")
            .unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn bad_date_is_not_parsed() {
        assert_eq!(parse_date("01/05/2024"), None);
        assert_eq!(parse_date("2024-05-01"), NaiveDate::from_ymd_opt(2024, 5, 1));
    }
}
