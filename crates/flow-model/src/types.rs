// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Declared data types and variable declarations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a variable, parameter, or return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Void,
    Boolean,
    Integer,
    Decimal,
    Text,
    DateTime,
    /// Enumeration, by qualified name ("Shop.OrderStatus").
    Enumeration(String),
    /// Domain object, by qualified name ("Shop.domain.Order").
    Object(String),
    /// Ordered collection of elements.
    List(Box<DataType>),
}

impl DataType {
    pub fn object(name: impl Into<String>) -> Self {
        DataType::Object(name.into())
    }

    pub fn list(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, DataType::Void)
    }

    /// Element type of a list; `None` for non-list types.
    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::List(element) => Some(element),
            _ => None,
        }
    }

    /// Java spelling of the type.
    pub fn java_name(&self) -> String {
        match self {
            DataType::Void => "void".to_string(),
            DataType::Boolean => "Boolean".to_string(),
            DataType::Integer => "Long".to_string(),
            DataType::Decimal => "java.math.BigDecimal".to_string(),
            DataType::Text => "String".to_string(),
            DataType::DateTime => "java.util.Date".to_string(),
            DataType::Enumeration(name) => name.replacen('.', ".enumeration.", 1),
            DataType::Object(name) => name.clone(),
            DataType::List(element) => format!("java.util.List<{}>", element.java_name()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.java_name())
    }
}

/// A declared variable: name and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub data_type: DataType,
}

impl Declaration {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A procedure parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}
