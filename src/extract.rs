//! Base-feature extraction from the preprocessing section.

use std::iter;

use crate::document::Document;
use crate::error::Result;
use crate::schema::{FeatureSyntax, Record};

pub const STREAMS: [&str; 3] = ["packets", "flows", "flow_aggregations"];

type Features<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// Base feature names declared by `doc`: every packet's, then every flow's,
/// then every flow aggregation's. Elements without `features` are skipped and
/// repeated names are kept. Streams are only read as the iterator reaches them.
pub fn base_features<'a>(doc: &'a Document) -> impl Iterator<Item = Result<String>> + 'a {
    let syntax = doc.schema().features;
    doc.section("preprocessing")
        .transpose()
        .into_iter()
        .flat_map(move |section| preprocessing_features(section, syntax))
}

fn preprocessing_features<'a>(section: Result<Record<'a>>, syntax: FeatureSyntax) -> Features<'a> {
    match section {
        Ok(section) => Box::new(
            STREAMS
                .into_iter()
                .flat_map(move |stream| stream_features(section, stream, syntax)),
        ),
        Err(e) => Box::new(iter::once(Err(e))),
    }
}

fn stream_features<'a>(section: Record<'a>, stream: &str, syntax: FeatureSyntax) -> Features<'a> {
    match section.records(stream) {
        Ok(elements) => Box::new(
            elements
                .into_iter()
                .flat_map(move |element| element_features(element, syntax)),
        ),
        Err(e) => Box::new(iter::once(Err(e))),
    }
}

fn element_features(element: Record<'_>, syntax: FeatureSyntax) -> Vec<Result<String>> {
    match element.raw_field("features") {
        Ok(Some(features)) => syntax.base_feature_names(features).into_iter().map(Ok).collect(),
        Ok(None) => Vec::new(),
        Err(e) => vec![Err(e)],
    }
}
