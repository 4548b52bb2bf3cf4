//! Index and datatype kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConstructionError;

/// Index kinds understood by the storage layer.
///
/// A field carrying `Ordered`, `Unique` or `Empty` is *relational*: its
/// value is additionally extracted into the relational side-channel when a
/// document is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Index {
    None,
    Textual,
    Ordered,
    Unique,
    Phonetic,
    Fuzzy,
    Empty,
}

impl Index {
    /// All valid index kinds, in wire order.
    pub const ALL: [Index; 7] = [
        Index::None,
        Index::Textual,
        Index::Ordered,
        Index::Unique,
        Index::Phonetic,
        Index::Fuzzy,
        Index::Empty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Index::None => "None",
            Index::Textual => "Textual",
            Index::Ordered => "Ordered",
            Index::Unique => "Unique",
            Index::Phonetic => "Phonetic",
            Index::Fuzzy => "Fuzzy",
            Index::Empty => "Empty",
        }
    }

    /// Whether this index kind implies relational extraction.
    pub fn is_relational(&self) -> bool {
        matches!(self, Index::Ordered | Index::Unique | Index::Empty)
    }
}

impl FromStr for Index {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Index::ALL
            .iter()
            .find(|i| i.as_str() == s)
            .copied()
            .ok_or_else(|| ConstructionError::InvalidIndex(s.to_string()))
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar and composite datatypes a field can carry.
///
/// Each kind is bound to exactly one codec in the
/// [`CodecRegistry`](crate::schema::CodecRegistry), which builds its
/// validation rule and defines its round-trip-safe scalar representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Date,
    DateTime,
    Decimal,
    Document,
    Email,
    File,
    Html,
    Image,
    Integer,
    Json,
    Money,
    Password,
    SelfEnumerated,
    Sound,
    Text,
    TextArea,
    Time,
    Url,
    Video,
}

impl DataType {
    /// All valid datatypes, in wire order.
    pub const ALL: [DataType; 20] = [
        DataType::Boolean,
        DataType::Date,
        DataType::DateTime,
        DataType::Decimal,
        DataType::Document,
        DataType::Email,
        DataType::File,
        DataType::Html,
        DataType::Image,
        DataType::Integer,
        DataType::Json,
        DataType::Money,
        DataType::Password,
        DataType::SelfEnumerated,
        DataType::Sound,
        DataType::Text,
        DataType::TextArea,
        DataType::Time,
        DataType::Url,
        DataType::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "Boolean",
            DataType::Date => "Date",
            DataType::DateTime => "DateTime",
            DataType::Decimal => "Decimal",
            DataType::Document => "Document",
            DataType::Email => "Email",
            DataType::File => "File",
            DataType::Html => "Html",
            DataType::Image => "Image",
            DataType::Integer => "Integer",
            DataType::Json => "Json",
            DataType::Money => "Money",
            DataType::Password => "Password",
            DataType::SelfEnumerated => "SelfEnumerated",
            DataType::Sound => "Sound",
            DataType::Text => "Text",
            DataType::TextArea => "TextArea",
            DataType::Time => "Time",
            DataType::Url => "Url",
            DataType::Video => "Video",
        }
    }

    /// Whether values of this datatype reference stored file content.
    pub fn is_attachment(&self) -> bool {
        matches!(
            self,
            DataType::Document
                | DataType::File
                | DataType::Image
                | DataType::Sound
                | DataType::Video
        )
    }
}

impl FromStr for DataType {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .find(|d| d.as_str() == s)
            .copied()
            .ok_or_else(|| ConstructionError::InvalidDataType(s.to_string()))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_parse_roundtrip() {
        for index in Index::ALL {
            assert_eq!(index.as_str().parse::<Index>().unwrap(), index);
        }
    }

    #[test]
    fn test_index_parse_invalid() {
        let err = "Sorted".parse::<Index>().unwrap_err();
        assert_eq!(err, ConstructionError::InvalidIndex("Sorted".to_string()));
    }

    #[test]
    fn test_relational_indices() {
        let relational: Vec<Index> = Index::ALL
            .iter()
            .filter(|i| i.is_relational())
            .copied()
            .collect();
        assert_eq!(relational, vec![Index::Ordered, Index::Unique, Index::Empty]);
    }

    #[test]
    fn test_datatype_parse_roundtrip() {
        for datatype in DataType::ALL {
            assert_eq!(datatype.as_str().parse::<DataType>().unwrap(), datatype);
        }
    }

    #[test]
    fn test_datatype_parse_invalid() {
        let err = "Float".parse::<DataType>().unwrap_err();
        assert_eq!(err, ConstructionError::InvalidDataType("Float".to_string()));
    }

    #[test]
    fn test_attachment_datatypes() {
        let attachments: Vec<DataType> = DataType::ALL
            .iter()
            .filter(|d| d.is_attachment())
            .copied()
            .collect();
        assert_eq!(
            attachments,
            vec![
                DataType::Document,
                DataType::File,
                DataType::Image,
                DataType::Sound,
                DataType::Video,
            ]
        );
    }
}
