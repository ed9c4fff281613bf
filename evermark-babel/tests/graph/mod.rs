mod clusters;
mod traversal;
