//! Bone hierarchy used to measure the tracked body.

use crate::error::RigError;

/// A bone identifier (index into skeleton).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoneId(pub u32);

impl BoneId {
    /// Returns the index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A bone in a skeleton.
#[derive(Debug, Clone)]
pub struct Bone {
    /// Human-readable name.
    pub name: String,
    /// Parent bone (None for root).
    pub parent: Option<BoneId>,
    /// Distance from this bone's head to its parent's head.
    pub length: f32,
}

impl Bone {
    /// Creates a root bone.
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            parent: None,
            length,
        }
    }

    /// Sets the parent bone.
    pub fn with_parent(mut self, parent: BoneId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// A skeleton (hierarchy of bones).
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Creates an empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bone and returns its ID.
    pub fn add_bone(&mut self, bone: Bone) -> BoneId {
        let id = BoneId(self.bones.len() as u32);
        self.bones.push(bone);
        id
    }

    /// Returns the number of bones.
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Returns a bone by ID.
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    /// Returns a mutable bone by ID.
    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut Bone> {
        self.bones.get_mut(id.index())
    }

    /// Finds a bone by name.
    pub fn find_bone(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .position(|b| b.name == name)
            .map(|i| BoneId(i as u32))
    }

    /// Finds a bone by name, failing with [`RigError::BoneNotFound`].
    pub fn require_bone(&self, name: &str) -> Result<BoneId, RigError> {
        self.find_bone(name)
            .ok_or_else(|| RigError::BoneNotFound(name.to_string()))
    }

    /// Bones from `descendant` up to (excluding) `ancestor`, lowest first.
    pub fn chain(&self, ancestor: BoneId, descendant: BoneId) -> Result<Vec<BoneId>, RigError> {
        let mut chain = Vec::new();
        let mut current = Some(descendant);

        while let Some(id) = current {
            if id == ancestor {
                return Ok(chain);
            }
            // A well-formed hierarchy never has more links than bones
            if chain.len() > self.bones.len() {
                break;
            }
            chain.push(id);
            current = self.bone(id).and_then(|b| b.parent);
        }

        Err(RigError::NotAnAncestor {
            ancestor: self.name_of(ancestor),
            descendant: self.name_of(descendant),
        })
    }

    /// Sum of bone lengths along the chain from `descendant` up to `ancestor`.
    pub fn chain_length(&self, ancestor: BoneId, descendant: BoneId) -> Result<f32, RigError> {
        Ok(self
            .chain(ancestor, descendant)?
            .into_iter()
            .filter_map(|id| self.bone(id))
            .map(|b| b.length)
            .sum())
    }

    fn name_of(&self, id: BoneId) -> String {
        self.bone(id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| format!("#{}", id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// hips -> thigh -> shin -> foot, hips -> spine -> neck -> head
    fn body_skeleton() -> Skeleton {
        let mut skel = Skeleton::new();
        let hips = skel.add_bone(Bone::new("hips", 0.0));
        let thigh = skel.add_bone(Bone::new("thigh", 0.45).with_parent(hips));
        let shin = skel.add_bone(Bone::new("shin", 0.42).with_parent(thigh));
        skel.add_bone(Bone::new("foot", 0.08).with_parent(shin));
        let spine = skel.add_bone(Bone::new("spine", 0.3).with_parent(hips));
        let neck = skel.add_bone(Bone::new("neck", 0.25).with_parent(spine));
        skel.add_bone(Bone::new("head", 0.15).with_parent(neck));
        skel
    }

    #[test]
    fn test_find_bone() {
        let skel = body_skeleton();
        assert_eq!(skel.bone_count(), 7);
        assert_eq!(skel.find_bone("shin"), Some(BoneId(2)));
        assert_eq!(skel.find_bone("tail"), None);
        assert_eq!(
            skel.require_bone("tail"),
            Err(RigError::BoneNotFound("tail".into()))
        );
    }

    #[test]
    fn test_chain() {
        let skel = body_skeleton();
        let hips = skel.find_bone("hips").unwrap();
        let foot = skel.find_bone("foot").unwrap();

        let chain = skel.chain(hips, foot).unwrap();
        assert_eq!(chain, vec![BoneId(3), BoneId(2), BoneId(1)]);
    }

    #[test]
    fn test_chain_length() {
        let skel = body_skeleton();
        let hips = skel.find_bone("hips").unwrap();
        let foot = skel.find_bone("foot").unwrap();
        let head = skel.find_bone("head").unwrap();

        assert!((skel.chain_length(hips, foot).unwrap() - 0.95).abs() < 1e-5);
        assert!((skel.chain_length(hips, head).unwrap() - 0.7).abs() < 1e-5);
        assert_eq!(skel.chain_length(hips, hips).unwrap(), 0.0);
    }

    #[test]
    fn test_chain_not_ancestor() {
        let skel = body_skeleton();
        let foot = skel.find_bone("foot").unwrap();
        let head = skel.find_bone("head").unwrap();

        let err = skel.chain(foot, head).unwrap_err();
        assert_eq!(
            err,
            RigError::NotAnAncestor {
                ancestor: "foot".into(),
                descendant: "head".into(),
            }
        );
    }

    #[test]
    fn test_chain_cycle_terminates() {
        let mut skel = Skeleton::new();
        let a = skel.add_bone(Bone::new("a", 1.0));
        let b = skel.add_bone(Bone::new("b", 1.0).with_parent(a));
        skel.bone_mut(a).unwrap().parent = Some(b);
        let c = skel.add_bone(Bone::new("c", 1.0));

        assert!(skel.chain(c, b).is_err());
    }
}
