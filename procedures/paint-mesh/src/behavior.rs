use bevy::ecs::system::EntityCommands;
use bevy::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

/// Behaviors that can be attached to a generated surface.
///
/// Attaching inserts a fresh component built from the template's values, so every surface gets
/// its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BehaviorTemplate {
	Spin { radians_per_second: f32 },
	Bob { amplitude: f32, frequency: f32 },
	Fertile { growth_multiplier: f32 },
}

impl BehaviorTemplate {
	pub fn attach(&self, entity: &mut EntityCommands) {
		match *self {
			Self::Spin { radians_per_second } => {
				entity.insert(Spin { radians_per_second });
			}
			Self::Bob { amplitude, frequency } => {
				entity.insert(Bob::new(amplitude, frequency));
			}
			Self::Fertile { growth_multiplier } => {
				entity.insert(Fertile { growth_multiplier });
			}
		}
	}
}

/// Deserializes a behavior list, skipping entries of unknown kind instead of failing the whole
/// configuration.
pub fn deserialize_behaviors<'de, D>(deserializer: D) -> Result<Vec<BehaviorTemplate>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
	Ok(raw
		.into_iter()
		.filter_map(|value| match serde_json::from_value::<BehaviorTemplate>(value.clone()) {
			Ok(template) => Some(template),
			Err(e) => {
				log::warn!("Unsupported behavior {} rejected: {}", value, e);
				None
			}
		})
		.collect())
}

/// Rotates the entity about its local Y axis.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Spin {
	pub radians_per_second: f32,
}

/// Moves the entity up and down around the height it had when bobbing started.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Bob {
	pub amplitude: f32,
	/// Oscillations per second
	pub frequency: f32,
	elapsed: f32,
	anchor: Option<f32>,
}

impl Bob {
	pub fn new(amplitude: f32, frequency: f32) -> Self {
		Self { amplitude, frequency, elapsed: 0.0, anchor: None }
	}

	/// Vertical displacement after `elapsed` seconds.
	pub fn offset_at(&self, elapsed: f32) -> f32 {
		self.amplitude * (std::f32::consts::TAU * self.frequency * elapsed).sin()
	}
}

/// Scales crop growth on fill objects parented to this surface.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Fertile {
	pub growth_multiplier: f32,
}

impl Default for Fertile {
	fn default() -> Self {
		Self { growth_multiplier: 1.0 }
	}
}

pub fn spin_surfaces(time: Res<Time>, mut query: Query<(&Spin, &mut Transform)>) {
	let dt = time.delta_secs();
	for (spin, mut transform) in query.iter_mut() {
		transform.rotate_y(spin.radians_per_second * dt);
	}
}

pub fn bob_surfaces(time: Res<Time>, mut query: Query<(&mut Bob, &mut Transform)>) {
	let dt = time.delta_secs();
	for (mut bob, mut transform) in query.iter_mut() {
		let anchor = *bob.anchor.get_or_insert(transform.translation.y);
		bob.elapsed += dt;
		transform.translation.y = anchor + bob.offset_at(bob.elapsed);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Deserialize)]
	struct Behaviors {
		#[serde(deserialize_with = "deserialize_behaviors")]
		behaviors: Vec<BehaviorTemplate>,
	}

	#[test]
	fn test_unknown_kinds_skipped() {
		let json = r#"{ "behaviors": [
			{ "kind": "Spin", "radians_per_second": 1.5 },
			{ "kind": "Rigidbody", "mass": 3.0 },
			{ "kind": "Bob" },
			{ "kind": "Bob", "amplitude": 0.2, "frequency": 0.5 }
		] }"#;

		let parsed: Behaviors = serde_json::from_str(json).unwrap();
		assert_eq!(
			parsed.behaviors,
			vec![
				BehaviorTemplate::Spin { radians_per_second: 1.5 },
				BehaviorTemplate::Bob { amplitude: 0.2, frequency: 0.5 },
			]
		);
	}

	#[test]
	fn test_attach_inserts_component_copies() {
		let mut world = World::new();
		let first = world.spawn_empty().id();
		let second = world.spawn_empty().id();

		let template = BehaviorTemplate::Fertile { growth_multiplier: 3.0 };
		{
			let mut commands = world.commands();
			template.attach(&mut commands.entity(first));
			template.attach(&mut commands.entity(second));
			BehaviorTemplate::Spin { radians_per_second: 2.0 }.attach(&mut commands.entity(second));
		}
		world.flush();

		assert_eq!(world.get::<Fertile>(first), Some(&Fertile { growth_multiplier: 3.0 }));
		assert_eq!(world.get::<Fertile>(second), Some(&Fertile { growth_multiplier: 3.0 }));
		assert!(world.get::<Spin>(first).is_none());
		assert_eq!(world.get::<Spin>(second).map(|s| s.radians_per_second), Some(2.0));

		// copies are independent
		if let Some(mut fertile) = world.get_mut::<Fertile>(first) {
			fertile.growth_multiplier = 0.5;
		}
		assert_eq!(world.get::<Fertile>(second).map(|f| f.growth_multiplier), Some(3.0));
	}

	#[test]
	fn test_bob_offset() {
		let bob = Bob::new(0.5, 1.0);
		assert_eq!(bob.offset_at(0.0), 0.0);
		assert!((bob.offset_at(0.25) - 0.5).abs() < 1e-5);
		assert!((bob.offset_at(0.75) + 0.5).abs() < 1e-5);
	}
}
