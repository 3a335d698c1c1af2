/// Settings a compilation is run with.
#[derive(Clone, Debug, Default)]
pub struct Options {
	/// Fail instead of warning when uniform bindings do not form a contiguous range starting at zero.
	pub strict_uniforms: bool,
	pub limits: Limits,
}

impl Options {
	pub fn strict() -> Self {
		Self {
			strict_uniforms: true,
			..Self::default()
		}
	}
}

/// Resource ceilings enforced while the declaration lists are built.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Limits {
	pub max_attribute_slots: u32,
	pub max_outputs: u32,
	pub max_internal_slots: u32,
	pub max_uniforms: u32,
	pub max_subpass_inputs: u32,
}

impl Default for Limits {
	fn default() -> Self {
		Self {
			max_attribute_slots: 16,
			max_outputs: 8,
			max_internal_slots: 16,
			max_uniforms: 32,
			max_subpass_inputs: 4,
		}
	}
}
