//! The level document that generated geometry is written into.

use std::collections::BTreeMap;

use glam::DVec3;

use crate::face::{Face, FaceId, Solid, SolidId, UvAxis};

/// Unique identifier of an entity within one [`LevelDoc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// One I/O connection fired by an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityOutput {
    pub output: String,
    pub target: String,
    pub input: String,
    pub param: String,
    pub delay: f64,
}

impl EntityOutput {
    /// A connection with no parameter or delay.
    pub fn new(output: &str, target: &str, input: &str) -> Self {
        Self {
            output: output.to_string(),
            target: target.to_string(),
            input: input.to_string(),
            param: String::new(),
            delay: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

/// A point or brush entity: a class name, key/values and optional solids.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Entity class, e.g. `info_overlay`.
    pub classname: String,
    /// Key/value pairs, sorted by key.
    pub keys: BTreeMap<String, String>,
    /// Brushes owned by a brush entity.
    pub solids: Vec<Solid>,
    /// I/O connections, in the order they were added.
    pub outputs: Vec<EntityOutput>,
}

impl Entity {
    /// Returns the value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.keys.insert(key.to_string(), value.into());
    }

    pub fn add_output(&mut self, output: EntityOutput) {
        self.outputs.push(output);
    }

    /// Parses the `origin` key as three space-separated numbers.
    pub fn origin(&self) -> Option<DVec3> {
        let mut parts = self.get("origin")?.split_whitespace().map(str::parse::<f64>);
        let x = parts.next()?.ok()?;
        let y = parts.next()?.ok()?;
        let z = parts.next()?.ok()?;
        Some(DVec3::new(x, y, z))
    }
}

/// Formats a vector the way entity keys store positions.
pub fn format_vec(v: DVec3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

/// Output level: world brushes plus entities, with identifier allocation.
#[derive(Debug, Default)]
pub struct LevelDoc {
    /// Brushes belonging to the world.
    pub brushes: Vec<Solid>,
    entities: BTreeMap<EntityId, Entity>,
    next_face: u32,
    next_solid: u32,
    next_entity: u32,
}

impl LevelDoc {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh face identifier.
    pub fn alloc_face_id(&mut self) -> FaceId {
        self.next_face += 1;
        FaceId(self.next_face)
    }

    /// Allocates a fresh solid identifier.
    pub fn alloc_solid_id(&mut self) -> SolidId {
        self.next_solid += 1;
        SolidId(self.next_solid)
    }

    /// Creates a face with a newly allocated identifier.
    ///
    /// Texture axes default to the two world axes most perpendicular to the
    /// normal.
    pub fn new_face(&mut self, point: DVec3, normal: DVec3, material: impl Into<String>) -> Face {
        let (u, v) = default_uv_axes(normal);
        Face {
            id: self.alloc_face_id(),
            point,
            normal,
            material: material.into(),
            u_axis: UvAxis::new(u),
            v_axis: UvAxis::new(v),
        }
    }

    /// Copies `face` under a newly allocated identifier.
    pub fn copy_face(&mut self, face: &Face) -> Face {
        Face {
            id: self.alloc_face_id(),
            ..face.clone()
        }
    }

    /// Wraps faces into a solid with a new identifier.
    pub fn new_solid(&mut self, faces: Vec<Face>) -> Solid {
        Solid {
            id: self.alloc_solid_id(),
            faces,
        }
    }

    /// Builds an axis-aligned box between the corners `min` and `max`.
    ///
    /// Faces come top first, then bottom, then the four sides.
    pub fn make_prism(&mut self, min: DVec3, max: DVec3, material: &str) -> Solid {
        let faces = [
            (max, DVec3::Z),
            (min, DVec3::NEG_Z),
            (max, DVec3::X),
            (min, DVec3::NEG_X),
            (max, DVec3::Y),
            (min, DVec3::NEG_Y),
        ]
        .into_iter()
        .map(|(point, normal)| self.new_face(point, normal, material))
        .collect();
        self.new_solid(faces)
    }

    /// Appends a brush to the world.
    pub fn add_brush(&mut self, solid: Solid) {
        self.brushes.push(solid);
    }

    /// Creates an entity and returns its identifier.
    pub fn create_entity<'a>(
        &mut self,
        classname: &str,
        keys: impl IntoIterator<Item = (&'a str, String)>,
    ) -> EntityId {
        self.next_entity += 1;
        let id = EntityId(self.next_entity);
        let entity = Entity {
            id,
            classname: classname.to_string(),
            keys: keys
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            solids: Vec::new(),
            outputs: Vec::new(),
        };
        self.entities.insert(id, entity);
        id
    }

    /// Looks up an entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks up an entity for modification.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Removes an entity, returning it.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Returns `true` if the entity still exists.
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Iterates over entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Iterates over entities of the given class.
    pub fn entities_by_class<'a>(&'a self, classname: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities().filter(move |ent| ent.classname == classname)
    }

    /// Iterates over every solid, world and entity-owned.
    pub fn all_solids(&self) -> impl Iterator<Item = &Solid> + '_ {
        self.brushes
            .iter()
            .chain(self.entities.values().flat_map(|ent| ent.solids.iter()))
    }

    /// Finds a face anywhere in the document.
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.all_solids().find_map(|solid| solid.face(id))
    }
}

/// Picks texture axes for a face with the given normal.
fn default_uv_axes(normal: DVec3) -> (DVec3, DVec3) {
    let abs = normal.abs();
    if abs.z >= abs.x && abs.z >= abs.y {
        (DVec3::X, DVec3::NEG_Y)
    } else if abs.x >= abs.y {
        (DVec3::Y, DVec3::NEG_Z)
    } else {
        (DVec3::X, DVec3::NEG_Z)
    }
}
