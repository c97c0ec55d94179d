pub mod lineage_graph;
