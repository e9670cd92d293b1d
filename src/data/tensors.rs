// ============================================================
// Layer 4 — Graph → Tensor Conversion
// ============================================================
// Turns a GraphData into device tensors. The whole graph is
// one "batch": features become a [N, D] float tensor, labels a
// [N] int tensor. Connectivity stays as an EdgeIndex; the
// encoder builds its dense adjacency mask from it once per
// forward pass.
//
// B is the Burn Backend (e.g. NdArray, Autodiff<NdArray>) so
// the same conversion feeds training and inference.

use burn::{prelude::*, tensor::TensorData};

use crate::domain::{edge_index::EdgeIndex, graph::GraphData};

/// A graph resident on a device.
#[derive(Debug, Clone)]
pub struct GraphTensors<B: Backend> {
    /// Node features — shape: [num_nodes, feature_dim]
    pub features: Tensor<B, 2>,

    /// Connectivity shared by every layer
    pub edges: EdgeIndex,

    /// Node labels — shape: [num_nodes]
    pub labels: Option<Tensor<B, 1, Int>>,
}

impl<B: Backend> GraphTensors<B> {
    pub fn from_graph(graph: &GraphData, device: &B::Device) -> Self {
        let features = Tensor::<B, 2>::from_data(
            TensorData::new(graph.flat_features(), [graph.num_nodes(), graph.feature_dim()]),
            device,
        );

        let labels = graph.labels.as_ref().map(|l| {
            let ids: Vec<i32> = l.iter().map(|&x| x as i32).collect();
            Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device)
        });

        Self { features, edges: graph.edges.clone(), labels }
    }
}

/// Node ids as a 1-D int tensor, for `Tensor::select` along dim 0.
pub fn node_index<B: Backend>(ids: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let ids: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
    Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device)
}
