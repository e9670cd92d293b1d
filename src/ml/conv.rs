// ============================================================
// Layer 5 — Graph Attention Convolution
// ============================================================
// One GAT layer (Veličković et al., 2018) over a dense
// adjacency mask. For every head k:
//
//   z_i    = W x_i                                  (shared projection)
//   e_ij   = LeakyReLU(a_dst · z_i + a_src · z_j)   for each edge j → i
//   α_ij   = softmax over incoming edges of i
//   h_i    = Σ_j α_ij z_j
//
// Heads are concatenated ([N, heads * out]) or averaged
// ([N, out]). Then residual, bias and normalisation.
//
// Self-loops are never inserted: a node only attends to itself
// when the edge i → i is in the EdgeIndex, and a node with no
// incoming edges aggregates to zero.
//
// Parameters are re-initialised with Xavier-normal (gain 1.414)
// on construction; the bias starts at zero.
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    module::Param,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::{
        activation::{leaky_relu, softmax},
        Distribution, TensorData,
    },
};

use crate::domain::edge_index::EdgeIndex;
use crate::ml::norm::{Norm, NormKind};

/// Gain used for every Xavier-normal initialisation in a GAT layer.
pub const XAVIER_GAIN: f64 = 1.414;

// Score given to non-edges before the softmax. Finite so that a
// row without any incoming edge stays NaN-free.
const MASKED_SCORE: f32 = -1.0e9;

// ─── Adjacency ────────────────────────────────────────────────────────────────
/// Dense connectivity on a device: mask[i, j] is true when j → i.
#[derive(Debug, Clone)]
pub struct Adjacency<B: Backend> {
    mask: Tensor<B, 2, Bool>,
}

impl<B: Backend> Adjacency<B> {
    pub fn from_edges(edges: &EdgeIndex, device: &B::Device) -> Self {
        let n    = edges.num_nodes();
        let flat: Vec<f32> = edges
            .dense_adjacency()
            .into_iter()
            .map(|e| if e { 1.0 } else { 0.0 })
            .collect();
        let mask = Tensor::<B, 2>::from_data(TensorData::new(flat, [n, n]), device).greater_elem(0.5);
        Self { mask }
    }

    /// [num_nodes (target), num_nodes (source)]
    pub fn mask(&self) -> Tensor<B, 2, Bool> {
        self.mask.clone()
    }
}

// ─── AttentionConv ────────────────────────────────────────────────────────────
/// The capability the encoder needs from an attention layer.
/// `GatConv` is the implementation shipped with this crate.
pub trait AttentionConv<B: Backend> {
    /// x: [num_nodes, in_width] → [num_nodes, output_width]
    fn forward(&self, x: Tensor<B, 2>, adjacency: &Adjacency<B>) -> Tensor<B, 2>;

    /// Resample every weight; biases go back to zero.
    fn reset_parameters(&mut self);

    fn in_width(&self) -> usize;

    /// Width of one head's output.
    fn head_width(&self) -> usize;

    fn heads(&self) -> usize;

    fn concat(&self) -> bool;

    /// Width of the layer's output after combining heads.
    fn output_width(&self) -> usize {
        if self.concat() {
            self.head_width() * self.heads()
        } else {
            self.head_width()
        }
    }
}

// ─── GatConvConfig ────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct GatConvConfig {
    pub in_width:  usize,
    pub out_width: usize,
    pub heads:     usize,
    #[config(default = true)]
    pub concat: bool,
    #[config(default = 0.2)]
    pub negative_slope: f64,
    #[config(default = 0.0)]
    pub attn_drop: f64,
    #[config(default = false)]
    pub residual: bool,
    #[config(default = "NormKind::None")]
    pub norm: NormKind,
}

impl GatConvConfig {
    pub fn output_width(&self) -> usize {
        if self.concat { self.out_width * self.heads } else { self.out_width }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> GatConv<B> {
        let hidden = self.out_width * self.heads;
        let width  = self.output_width();

        // Residual needs a projection only when the widths differ
        let residual_proj = (self.residual && self.in_width != width)
            .then(|| LinearConfig::new(self.in_width, width).with_bias(false).init(device));

        let mut conv = GatConv {
            lin:      LinearConfig::new(self.in_width, hidden).with_bias(false).init(device),
            att_src:  Param::from_tensor(Tensor::zeros([1, self.heads, self.out_width], device)),
            att_dst:  Param::from_tensor(Tensor::zeros([1, self.heads, self.out_width], device)),
            bias:     Param::from_tensor(Tensor::zeros([width], device)),
            residual_proj,
            residual: self.residual,
            norm:     self.norm.init(width, device),
            attn_drop: DropoutConfig::new(self.attn_drop).init(),
            in_width:  self.in_width,
            out_width: self.out_width,
            heads:     self.heads,
            concat:    self.concat,
            negative_slope: self.negative_slope,
        };
        conv.reset_parameters();
        conv
    }
}

// ─── GatConv ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct GatConv<B: Backend> {
    /// Shared projection, weight [in_width, heads * out_width]
    pub lin:      Linear<B>,
    /// Source-side attention vector [1, heads, out_width]
    pub att_src:  Param<Tensor<B, 3>>,
    /// Target-side attention vector [1, heads, out_width]
    pub att_dst:  Param<Tensor<B, 3>>,
    /// [output_width]
    pub bias:     Param<Tensor<B, 1>>,
    residual_proj: Option<Linear<B>>,
    residual:  bool,
    norm:      Norm<B>,
    attn_drop: Dropout,
    in_width:  usize,
    out_width: usize,
    heads:     usize,
    concat:    bool,
    negative_slope: f64,
}

impl<B: Backend> GatConv<B> {
    pub fn has_residual(&self) -> bool {
        self.residual
    }

    pub fn norm_kind(&self) -> NormKind {
        self.norm.kind()
    }

    // [N, in] → [N, heads, out]
    fn project(&self, x: Tensor<B, 2>) -> Tensor<B, 3> {
        let [n, _] = x.dims();
        self.lin.forward(x).reshape([n, self.heads, self.out_width])
    }

    // Normalised attention [heads, N (target), N (source)]. Rows sum
    // to 1 over incoming edges, or to 0 for a node without any.
    fn coefficients(&self, z: Tensor<B, 3>, adjacency: &Adjacency<B>) -> Tensor<B, 3> {
        let [n, h, _] = z.dims();

        // Per-node attention logits for both ends of an edge: [N, H]
        let alpha_src = (z.clone() * self.att_src.val()).sum_dim(2).reshape([n, h]);
        let alpha_dst = (z * self.att_dst.val()).sum_dim(2).reshape([n, h]);

        // scores[k, i, j] = a_dst·z_i + a_src·z_j
        let dst    = alpha_dst.swap_dims(0, 1).reshape([h, n, 1]).expand([h, n, n]);
        let src    = alpha_src.swap_dims(0, 1).reshape([h, 1, n]).expand([h, n, n]);
        let scores = leaky_relu(dst + src, self.negative_slope);

        let mask   = adjacency.mask().unsqueeze_dim::<3>(0).expand([h, n, n]);
        let scores = scores.mask_fill(mask.clone().bool_not(), MASKED_SCORE);

        softmax(scores, 2) * mask.float()
    }
}

impl<B: Backend> AttentionConv<B> for GatConv<B> {
    fn forward(&self, x: Tensor<B, 2>, adjacency: &Adjacency<B>) -> Tensor<B, 2> {
        let [n, _] = x.dims();
        let (h, f) = (self.heads, self.out_width);

        let z     = self.project(x.clone());
        let alpha = self.attn_drop.forward(self.coefficients(z.clone(), adjacency));

        // [H, N, N] x [H, N, F] → [H, N, F]
        let out = alpha.matmul(z.swap_dims(0, 1));
        let out = if self.concat {
            out.swap_dims(0, 1).reshape([n, h * f])
        } else {
            out.mean_dim(0).reshape([n, f])
        };

        let out = match (&self.residual_proj, self.residual) {
            (Some(proj), _) => out + proj.forward(x),
            (None, true) => out + x,
            (None, false) => out,
        };

        let out = out + self.bias.val().unsqueeze::<2>();
        self.norm.forward(out)
    }

    fn reset_parameters(&mut self) {
        let device = self.bias.val().device();
        let (h, f) = (self.heads, self.out_width);

        // Fan sizes follow PyTorch's convention for these shapes:
        //   weight [h*f, in]  → fan_in = in,    fan_out = h*f
        //   att    [1, h, f]  → fan_in = h*f,   fan_out = f
        self.lin.weight = Param::from_tensor(xavier_normal([self.in_width, h * f], self.in_width, h * f, &device));
        self.att_src    = Param::from_tensor(xavier_normal([1, h, f], h * f, f, &device));
        self.att_dst    = Param::from_tensor(xavier_normal([1, h, f], h * f, f, &device));
        self.bias       = Param::from_tensor(Tensor::zeros([self.output_width()], &device));
    }

    fn in_width(&self) -> usize { self.in_width }

    fn head_width(&self) -> usize { self.out_width }

    fn heads(&self) -> usize { self.heads }

    fn concat(&self) -> bool { self.concat }
}

/// Sample N(0, std²) with std = gain * sqrt(2 / (fan_in + fan_out)).
pub fn xavier_normal<B: Backend, const D: usize>(
    shape:   [usize; D],
    fan_in:  usize,
    fan_out: usize,
    device:  &B::Device,
) -> Tensor<B, D> {
    let std = XAVIER_GAIN * (2.0 / (fan_in + fan_out).max(1) as f64).sqrt();
    Tensor::random(shape, Distribution::Normal(0.0, std), device)
}


// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn to_vec<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    fn star_graph() -> EdgeIndex {
        // node 0 receives from 1 and 2; node 3 is isolated
        EdgeIndex::from_pairs(4, &[(1, 0), (2, 0), (0, 1)]).unwrap()
    }

    fn features(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        Tensor::random([4, 5], Distribution::Normal(0.0, 1.0), device)
    }

    #[test]
    fn test_concat_output_width() {
        let device = Default::default();
        let conv   = GatConvConfig::new(5, 3, 4).init::<TestBackend>(&device);
        let adj    = Adjacency::from_edges(&star_graph(), &device);
        let out    = conv.forward(features(&device), &adj);
        assert_eq!(out.dims(), [4, 12]);
        assert_eq!(conv.output_width(), 12);
    }

    #[test]
    fn test_mean_output_width() {
        let device = Default::default();
        let conv   = GatConvConfig::new(5, 3, 4).with_concat(false).init::<TestBackend>(&device);
        let adj    = Adjacency::from_edges(&star_graph(), &device);
        assert_eq!(conv.forward(features(&device), &adj).dims(), [4, 3]);
    }

    #[test]
    fn test_attention_rows_sum_to_one_over_incoming_edges() {
        let device = Default::default();
        let conv   = GatConvConfig::new(5, 3, 2).init::<TestBackend>(&device);
        let adj    = Adjacency::from_edges(&star_graph(), &device);
        let alpha  = conv.coefficients(conv.project(features(&device)), &adj);
        assert_eq!(alpha.dims(), [2, 4, 4]);

        let sums = to_vec(alpha.clone().sum_dim(2).reshape([2, 4]));
        for head in 0..2 {
            assert!((sums[head * 4] - 1.0).abs() < 1e-5);     // node 0: two in-edges
            assert!((sums[head * 4 + 1] - 1.0).abs() < 1e-5); // node 1: one in-edge
            assert!(sums[head * 4 + 2].abs() < 1e-6);         // node 2: none
            assert!(sums[head * 4 + 3].abs() < 1e-6);         // node 3: isolated
        }

        // Non-edges carry no weight: node 0 never attends to itself or node 3
        let row0 = to_vec(alpha.slice([0..1, 0..1, 0..4]).reshape([4]));
        assert_eq!(row0[0], 0.0);
        assert_eq!(row0[3], 0.0);
    }

    #[test]
    fn test_isolated_node_gets_bias_only() {
        let device = Default::default();
        let conv   = GatConvConfig::new(5, 3, 2).init::<TestBackend>(&device);
        let adj    = Adjacency::from_edges(&star_graph(), &device);
        let out    = conv.forward(features(&device), &adj);
        // bias is zero after init and there is no residual
        let row3 = to_vec(out.slice([3..4, 0..6]));
        assert!(row3.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_single_neighbour_copies_projection() {
        let device = Default::default();
        let conv   = GatConvConfig::new(5, 3, 1).init::<TestBackend>(&device);
        let edges  = EdgeIndex::from_pairs(2, &[(0, 1)]).unwrap();
        let adj    = Adjacency::from_edges(&edges, &device);
        let x      = Tensor::<TestBackend, 2>::random([2, 5], Distribution::Normal(0.0, 1.0), &device);

        let out       = conv.forward(x.clone(), &adj);
        let projected = conv.lin.forward(x);
        let got  = to_vec(out.slice([1..2, 0..3]));
        let want = to_vec(projected.slice([0..1, 0..3]));
        for (g, w) in got.iter().zip(want.iter()) {
            assert!((g - w).abs() < 1e-5);
        }
    }

    #[test]
    fn test_identity_residual_when_widths_match() {
        let device = Default::default();
        let conv   = GatConvConfig::new(6, 3, 2).with_residual(true).init::<TestBackend>(&device);
        assert!(conv.residual_proj.is_none());
        assert!(conv.has_residual());

        // With no edges the output is exactly the input plus a zero bias
        let adj = Adjacency::from_edges(&EdgeIndex::from_pairs(3, &[]).unwrap(), &device);
        let x   = Tensor::<TestBackend, 2>::random([3, 6], Distribution::Normal(0.0, 1.0), &device);
        let out = conv.forward(x.clone(), &adj);
        for (o, i) in to_vec(out).iter().zip(to_vec(x).iter()) {
            assert!((o - i).abs() < 1e-6);
        }
    }

    #[test]
    fn test_projected_residual_when_widths_differ() {
        let device = Default::default();
        let conv   = GatConvConfig::new(5, 3, 2).with_residual(true).init::<TestBackend>(&device);
        assert!(conv.residual_proj.is_some());
    }

    #[test]
    fn test_reset_parameters_resamples_weights_and_zeroes_bias() {
        let device   = Default::default();
        let mut conv = GatConvConfig::new(8, 4, 2).init::<TestBackend>(&device);

        let w1 = to_vec(conv.lin.weight.val());
        let a1 = to_vec(conv.att_src.val());
        conv.reset_parameters();
        let w2 = to_vec(conv.lin.weight.val());
        let a2 = to_vec(conv.att_src.val());

        assert_ne!(w1, w2);
        assert_ne!(a1, a2);
        assert!(to_vec(conv.bias.val()).iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_xavier_normal_scale() {
        let device = Default::default();
        let t      = xavier_normal::<TestBackend, 2>([200, 200], 200, 200, &device);
        let values = to_vec(t);
        let mean   = values.iter().sum::<f32>() / values.len() as f32;
        let var    = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
        // expected std = 1.414 * sqrt(2 / 400) ≈ 0.1
        assert!((var.sqrt() - 0.1).abs() < 0.01);
    }
}
