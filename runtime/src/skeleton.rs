//! Runtime skeleton
//!
//! Bones are stored in descriptor order, so a [`BoneId`] indexes both the
//! runtime array and the file's bone table. Construction runs in two passes:
//! every bone is created first, then parent and child indices are resolved
//! against the finished array.

use glam::Affine3A;
use rmdl_format::{BoneDesc, Corruption, ResModel};
use smallvec::SmallVec;

use crate::error::LoadError;
use crate::model::{ModelId, ModelSource, try_vec};

/// Index of a bone within its skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub(crate) u32);

impl BoneId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Bone {
    id: BoneId,
    owner: ModelId,
    source: ModelSource,
    desc: BoneDesc,
    parent: Option<BoneId>,
    children: SmallVec<[BoneId; 4]>,
}

impl Bone {
    fn new(id: BoneId, owner: ModelId, source: ModelSource, desc: BoneDesc) -> Self {
        Self {
            id,
            owner,
            source,
            desc,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn id(&self) -> BoneId {
        self.id
    }

    /// Position in the skeleton's bone array.
    pub fn index(&self) -> usize {
        self.id.index()
    }

    /// Model whose skeleton owns this bone.
    pub fn owner(&self) -> ModelId {
        self.owner
    }

    pub fn desc(&self) -> &BoneDesc {
        &self.desc
    }

    pub fn name(&self) -> &str {
        self.desc.name.as_str(self.source.data())
    }

    pub fn local_transform(&self) -> &Affine3A {
        &self.desc.local_transform
    }

    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    pub fn children(&self) -> &[BoneId] {
        &self.children
    }
}

/// The bone tree of a model.
#[derive(Debug)]
pub struct Skeleton {
    owner: ModelId,
    bones: Vec<Bone>,
    root: Option<BoneId>,
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    OnChain,
    Done,
}

fn resolve(index: i32, count: usize) -> Option<BoneId> {
    usize::try_from(index)
        .ok()
        .filter(|&index| index < count)
        .map(|index| BoneId(index as u32))
}

impl Skeleton {
    /// A skeleton with no bones and no root.
    pub fn empty(owner: ModelId) -> Self {
        Self {
            owner,
            bones: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn build(
        res: &ResModel<'_>,
        owner: ModelId,
        source: &ModelSource,
    ) -> Result<Self, LoadError> {
        let desc = res.skeleton();
        let count = desc.num_bones();
        if count == 0 {
            return Ok(Self::empty(owner));
        }

        let mut bones = try_vec::<Bone>(count)?;
        for (index, bone_desc) in desc.bones.iter(res.data()).enumerate() {
            bones.push(Bone::new(
                BoneId(index as u32),
                owner,
                source.clone(),
                bone_desc,
            ));
        }

        let root = resolve(desc.root_index, count).ok_or(Corruption::RootIndexOutOfRange {
            index: desc.root_index,
            count,
        })?;

        for index in 0..count {
            let bone_desc = bones[index].desc;
            if bone_desc.parent_index >= 0 {
                let parent = resolve(bone_desc.parent_index, count).ok_or(
                    Corruption::ParentIndexOutOfRange {
                        bone: index,
                        index: bone_desc.parent_index,
                        count,
                    },
                )?;
                bones[index].parent = Some(parent);
            }

            for child in bone_desc.children.iter(res.data()) {
                let child_id = resolve(child, count).ok_or(Corruption::ChildIndexOutOfRange {
                    bone: index,
                    index: child,
                    count,
                })?;
                if bones[index].children.contains(&child_id) {
                    return Err(Corruption::InconsistentHierarchy {
                        bone: index,
                        child: child_id.index(),
                    }
                    .into());
                }
                bones[index].children.push(child_id);
            }
        }

        check_links(&bones)?;
        check_acyclic(&bones)?;

        Ok(Self {
            owner,
            bones,
            root: Some(root),
        })
    }

    pub fn owner(&self) -> ModelId {
        self.owner
    }

    pub fn root(&self) -> Option<&Bone> {
        self.root.map(|id| &self.bones[id.index()])
    }

    pub fn root_id(&self) -> Option<BoneId> {
        self.root
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// # Panics
    /// If `id` is not a bone of this skeleton.
    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.index()]
    }

    pub fn get(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn parent_of(&self, bone: &Bone) -> Option<&Bone> {
        bone.parent.map(|id| self.bone(id))
    }

    /// Index of `bone` in this skeleton, or `None` if it belongs to another one.
    pub fn bone_index(&self, bone: &Bone) -> Option<BoneId> {
        if bone.owner != self.owner {
            return None;
        }
        let candidate = self.bones.get(bone.index())?;
        std::ptr::eq(candidate, bone).then_some(bone.id)
    }

    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name() == name)
    }

    /// Depth-first, parent-before-children walk from the root, yielding each
    /// bone with its depth.
    pub fn walk(&self) -> Walk<'_> {
        let mut stack = SmallVec::new();
        if let Some(root) = self.root {
            stack.push((0, root));
        }
        Walk {
            skeleton: self,
            stack,
        }
    }

    /// Like [`Skeleton::walk`], starting from `start` instead of the root.
    pub fn walk_from(&self, start: BoneId) -> Walk<'_> {
        let mut stack = SmallVec::new();
        if start.index() < self.bones.len() {
            stack.push((0, start));
        }
        Walk {
            skeleton: self,
            stack,
        }
    }
}

impl Skeleton {
    /// The parentless bone whose subtree contains `id`.
    pub fn top_of(&self, id: BoneId) -> BoneId {
        let mut current = id;
        // Terminates: build rejects parent cycles
        while let Some(parent) = self.bones[current.index()].parent {
            current = parent;
        }
        current
    }

    /// Parentless bones, starting with the one above the root.
    ///
    /// The root is normally parentless itself. When it is not, its topmost
    /// ancestor comes first so the root's subtree is never listed twice.
    pub fn top_level(&self) -> impl Iterator<Item = BoneId> + '_ {
        let first = self.root.map(|root| self.top_of(root));
        let rest = self
            .bones
            .iter()
            .filter(move |bone| bone.parent.is_none() && Some(bone.id) != first)
            .map(|bone| bone.id);
        first.into_iter().chain(rest)
    }

    /// Depth-first walk over every bone, one tree per [`Skeleton::top_level`]
    /// bone. Depths restart at 0 for each tree.
    pub fn walk_all(&self) -> impl Iterator<Item = (usize, &Bone)> + '_ {
        self.top_level().flat_map(move |id| self.walk_from(id))
    }

    /// Model-space transform of every bone at bind time, indexed like
    /// [`Skeleton::bones`]: each parent's transform times the bone's local one.
    pub fn bind_pose(&self) -> Vec<Affine3A> {
        let mut pose = vec![Affine3A::IDENTITY; self.bones.len()];
        for (_, bone) in self.walk_all() {
            let parent = bone
                .parent
                .map_or(Affine3A::IDENTITY, |parent| pose[parent.index()]);
            pose[bone.index()] = parent * bone.desc.local_transform;
        }
        pose
    }
}

/// Every child must name this bone as its parent, and every parent must list
/// the bone as a child.
fn check_links(bones: &[Bone]) -> Result<(), Corruption> {
    for (index, bone) in bones.iter().enumerate() {
        for &child in &bone.children {
            if bones[child.index()].parent != Some(bone.id) {
                return Err(Corruption::InconsistentHierarchy {
                    bone: index,
                    child: child.index(),
                });
            }
        }
        if let Some(parent) = bone.parent {
            if !bones[parent.index()].children.contains(&bone.id) {
                return Err(Corruption::InconsistentHierarchy {
                    bone: parent.index(),
                    child: index,
                });
            }
        }
    }
    Ok(())
}

fn check_acyclic(bones: &[Bone]) -> Result<(), Corruption> {
    let mut state = vec![Visit::New; bones.len()];
    let mut chain = Vec::new();
    for start in 0..bones.len() {
        let mut current = Some(start);
        while let Some(index) = current {
            match state[index] {
                Visit::Done => break,
                Visit::OnChain => return Err(Corruption::HierarchyCycle { bone: index }),
                Visit::New => {
                    state[index] = Visit::OnChain;
                    chain.push(index);
                    current = bones[index].parent.map(BoneId::index);
                }
            }
        }
        for index in chain.drain(..) {
            state[index] = Visit::Done;
        }
    }
    Ok(())
}

/// Iterator returned by [`Skeleton::walk`].
pub struct Walk<'a> {
    skeleton: &'a Skeleton,
    stack: SmallVec<[(usize, BoneId); 16]>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Bone);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        let bone = self.skeleton.bone(id);
        self.stack
            .extend(bone.children.iter().rev().map(|&child| (depth + 1, child)));
        Some((depth, bone))
    }
}
