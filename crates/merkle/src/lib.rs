//! Two-level Merkle commitment scheme (spec §4.3).
//!
//! Internal nodes use **sorted-pair hashing**:
//!
//! ```text
//! node(a, b) := keccak256(min(a, b) || max(a, b))
//! ```
//!
//! which lets a proof carry sibling hashes only — no left/right position
//! flag — because the verifier always sorts the running hash against the
//! next sibling before hashing. Odd levels duplicate their last node, same
//! as the teacher's power-of-two padding in spirit but applied per level
//! rather than up front, since this engine does not require leaves to be a
//! power of two.

use justifai_errors::Error;
use justifai_hash::keccak256;

pub type Leaf = [u8; 32];

fn hash_pair(a: Leaf, b: Leaf) -> Leaf {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(&lo);
    data[32..].copy_from_slice(&hi);
    keccak256(&data)
}

/// All levels of a built tree, `levels[0]` being the (possibly
/// caller-padded) leaves and `levels.last()` a single-element root level.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Leaf>>,
}

impl MerkleTree {
    pub fn root(&self) -> Leaf {
        self.levels.last().expect("tree always has a root level")[0]
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.levels[0]
    }

    /// Ordered sibling hashes from `leaf_index` up to the root.
    pub fn proof_for_index(&self, mut index: usize) -> Vec<Leaf> {
        let mut siblings = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = if index % 2 == 0 {
                if index + 1 < level.len() {
                    index + 1
                } else {
                    // Odd level: last node was duplicated against itself.
                    index
                }
            } else {
                index - 1
            };
            siblings.push(level[sibling_index]);
            index /= 2;
        }
        siblings
    }

    /// Proof for the first occurrence of `leaf` among the tree's leaves.
    pub fn proof_for_leaf(&self, leaf: &Leaf) -> Option<Vec<Leaf>> {
        let index = self.levels[0].iter().position(|l| l == leaf)?;
        Some(self.proof_for_index(index))
    }
}

/// `buildTree(leaves)` (§4.3). Leaves are hashed bottom-up with sorted-pair
/// hashing; an odd count at any level duplicates the last node. A
/// single-leaf input is a valid (degenerate) tree whose root is the leaf
/// itself, with an empty proof.
pub fn build_tree(leaves: &[Leaf]) -> Result<MerkleTree, Error> {
    if leaves.is_empty() {
        return Err(Error::merkle("cannot build a tree with zero leaves"));
    }

    let mut levels = vec![leaves.to_vec()];
    while levels.last().unwrap().len() > 1 {
        let current = levels.last().unwrap();
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        let mut i = 0;
        while i < current.len() {
            if i + 1 < current.len() {
                next.push(hash_pair(current[i], current[i + 1]));
                i += 2;
            } else {
                next.push(hash_pair(current[i], current[i]));
                i += 1;
            }
        }
        levels.push(next);
    }

    Ok(MerkleTree { levels })
}

/// Build the cross-batch ("ultimate") tree over a batch's intermediate
/// roots (MRIs), in the caller-supplied order (must already be sorted by
/// `finalizedAt` ASC per spec §5). When there is exactly one MRI, the tree
/// is forced to two leaves by appending `keccak256(MRI)` as a padding leaf
/// (§4.3 special case), so the resulting MPU is never empty.
pub fn build_ultimate_tree(mris: &[Leaf]) -> Result<MerkleTree, Error> {
    if mris.is_empty() {
        return Err(Error::merkle("cannot build an ultimate tree with zero batches"));
    }
    if mris.len() == 1 {
        let padding = keccak256(&mris[0]);
        build_tree(&[mris[0], padding])
    } else {
        build_tree(mris)
    }
}

/// `root(tree)`.
pub fn root(tree: &MerkleTree) -> Leaf {
    tree.root()
}

/// `proof(tree, leaf)`.
pub fn proof(tree: &MerkleTree, leaf: &Leaf) -> Option<Vec<Leaf>> {
    tree.proof_for_leaf(leaf)
}

/// `verify(leaf, proof, root)`: recompute upward by repeatedly sorting the
/// running hash with the next sibling and hashing. A leaf identical to
/// `root` with an empty proof verifies trivially — this is what makes
/// `MRI == MRU` a valid empty-proof case during verification (§4.9 step 8)
/// without any special-casing here.
pub fn verify(leaf: &Leaf, proof: &[Leaf], root: &Leaf) -> bool {
    let mut current = *leaf;
    for sibling in proof {
        current = hash_pair(current, *sibling);
    }
    &current == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> Leaf {
        keccak256(&[byte])
    }

    #[test]
    fn single_leaf_tree_has_itself_as_root_and_empty_proof() {
        let l = leaf(0xaa);
        let tree = build_tree(&[l]).unwrap();
        assert_eq!(tree.root(), l);
        assert_eq!(tree.proof_for_leaf(&l).unwrap(), Vec::<Leaf>::new());
        assert!(verify(&l, &[], &tree.root()));
    }

    #[test]
    fn two_leaf_tree_matches_scenario_1_from_spec() {
        // spec.md §8 scenario 1: two-job single batch.
        let l1 = leaf(1);
        let l2 = leaf(2);
        let tree = build_tree(&[l1, l2]).unwrap();
        let expected_mri = hash_pair(l1, l2);
        assert_eq!(tree.root(), expected_mri);

        let ultimate = build_ultimate_tree(&[expected_mri]).unwrap();
        let padding = keccak256(&expected_mri);
        let expected_mru = hash_pair(expected_mri, padding);
        assert_eq!(ultimate.root(), expected_mru);

        let mpu = ultimate.proof_for_leaf(&expected_mri).unwrap();
        assert_eq!(mpu, vec![padding]);
        assert!(verify(&expected_mri, &mpu, &expected_mru));
    }

    #[test]
    fn five_leaf_proof_has_depth_three_and_verifies() {
        // spec.md §8 scenario 3.
        let leaves: Vec<Leaf> = (b'a'..=b'e').map(leaf).collect();
        let tree = build_tree(&leaves).unwrap();

        let c_leaf = leaves[2];
        let proof = tree.proof_for_leaf(&c_leaf).unwrap();
        assert_eq!(proof.len(), 3);
        assert!(verify(&c_leaf, &proof, &tree.root()));

        let wrong_leaf = leaf(b'f');
        assert!(!verify(&wrong_leaf, &proof, &tree.root()));
    }

    #[test]
    fn odd_levels_duplicate_last_node() {
        let leaves: Vec<Leaf> = (0u8..3).map(leaf).collect();
        let tree = build_tree(&leaves).unwrap();
        for (i, l) in leaves.iter().enumerate() {
            let proof = tree.proof_for_index(i);
            assert!(verify(l, &proof, &tree.root()), "leaf {i} failed");
        }
    }

    #[test]
    fn proofs_are_position_less_sibling_lists() {
        let leaves: Vec<Leaf> = (0u8..8).map(leaf).collect();
        let tree = build_tree(&leaves).unwrap();
        for (i, l) in leaves.iter().enumerate() {
            let p = tree.proof_for_index(i);
            assert_eq!(p.len(), 3);
            assert!(verify(l, &p, &tree.root()));
        }
    }

    #[test]
    fn build_tree_rejects_empty_input() {
        assert!(build_tree(&[]).is_err());
    }

    #[test]
    fn verify_accepts_equal_leaf_and_root_with_empty_proof() {
        let l = leaf(9);
        assert!(verify(&l, &[], &l));
    }

    #[test]
    fn hash_pair_is_order_independent() {
        let a = leaf(1);
        let b = leaf(2);
        assert_eq!(hash_pair(a, b), hash_pair(b, a));
    }
}
