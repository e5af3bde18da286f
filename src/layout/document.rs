//! The graph document served by the data-loading collaborator.

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphDocument {
	pub errors: Vec<String>,
	/// Keyed by object name, in document order.
	pub data: IndexMap<String, ObjectDescriptor>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
	pub name: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub group: Option<String>,
	#[serde(default)]
	pub depends: Vec<String>,
	/// Recomputed from `depends` on load; kept only for completeness.
	#[serde(default)]
	pub depended_on_by: Vec<String>,
	/// Pre-rendered HTML fragment.
	#[serde(default)]
	pub docs: String,
}

impl GraphDocument {
	pub fn from_json(text: &str) -> serde_json::Result<Self> {
		serde_json::from_str(text)
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	/// Object whose docs are shown before anything is selected: the first
	/// helper, or the `main` object.
	pub fn landing_object(&self) -> Option<&ObjectDescriptor> {
		self.data.values().find(|obj| {
			obj.kind == LANDING_KIND
				|| obj.group.as_deref() == Some(LANDING_KIND)
				|| obj.name == LANDING_NAME
		})
	}
}

const LANDING_KIND: &str = "Helper";
const LANDING_NAME: &str = "main";

const REFERENCE_CLASS: &str = "select-object";

/// Value of a double-quoted attribute inside the text of one tag.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
	let mut rest = tag;
	loop {
		let pos = rest.find(name)?;
		let starts_word = rest[..pos].ends_with(|c: char| c.is_ascii_whitespace());
		let after = &rest[pos + name.len()..];
		if starts_word {
			if let Some(value) = after.strip_prefix("=\"") {
				return value.find('"').map(|end| &value[..end]);
			}
		}
		rest = after;
	}
}

/// Object names referenced by `select-object` anchors in a docs fragment, in
/// order of appearance. Other elements carrying `data-name` are ignored.
pub fn doc_references(html: &str) -> Vec<&str> {
	let mut names = Vec::new();
	let mut rest = html;
	while let Some(open) = rest.find('<') {
		rest = &rest[open + 1..];
		let Some(close) = rest.find('>') else {
			break;
		};
		let tag = &rest[..close];
		rest = &rest[close + 1..];

		let is_reference = attribute(tag, "class")
			.is_some_and(|class| class.split_ascii_whitespace().any(|c| c == REFERENCE_CLASS));
		if let Some(name) = attribute(tag, "data-name").filter(|_| is_reference) {
			names.push(name);
		}
	}
	names
}
